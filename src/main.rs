mod chat_lock;
mod config;
mod quiz;

use std::sync::Arc;
use std::time::Duration;

use chat_lock::ChatLocks;
use config::Settings;
use dotenv::dotenv;
use quiz::arithmetic::Operation;
use quiz::config::DrillConfig;
use quiz::derivatives::DerivativeKind;
use quiz::factoring::FactoringKind;
use quiz::session::Session;
use quiz::{Detail, Module, Question};
use teloxide::{
    dispatching::dialogue::{
        serializer::Json, ErasedStorage, InMemStorage, SqliteStorage, Storage,
    },
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type DrillDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SessionStorage = Arc<ErasedStorage<State>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ChooseModule {
        session: Session,
    },
    Drill {
        session: Session,
    },
    Configure {
        session: Session,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting math drill bot...");

    let settings = Arc::new(Settings::from_env());
    let bot = Bot::from_env();
    let storage = open_storage(&settings.database_path).await;
    let locks = Arc::new(ChatLocks::default());

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(
                dptree::case![State::ChooseModule { session }].endpoint(receive_module_choice),
            )
            .branch(dptree::case![State::Drill { session }].endpoint(drill))
            .branch(dptree::case![State::Configure { session }].endpoint(configure)),
    )
    .dependencies(dptree::deps![storage, settings, locks])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

/// Sessions (and with them the running statistics) live in SQLite; without
/// it the bot keeps working from memory.
async fn open_storage(path: &str) -> SessionStorage {
    match SqliteStorage::open(path, Json).await {
        Ok(storage) => {
            log::info!("Sessions are stored in {}", path);
            storage.erase()
        }
        Err(err) => {
            log::warn!(
                "Cannot open {} ({}), sessions will not survive a restart",
                path,
                err
            );
            InMemStorage::<State>::new().erase()
        }
    }
}

async fn store(dialogue: &DrillDialogue, state: State) {
    if let Err(err) = dialogue.update(state).await {
        log::warn!(
            "Could not persist session for chat {}: {}",
            dialogue.chat_id().0,
            err
        );
    }
}

const GREETING_TEXT: &str = "Hi! I'm a math drill bot. Pick a module and I'll keep the questions coming: arithmetic, unit-circle trigonometry, factoring or derivatives.";
const NEW_QUESTION: &str = "New question";
const SETTINGS: &str = "Settings";
const MENU: &str = "Menu";
const DONE: &str = "Done";

fn module_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(Module::Arithmetic.label()),
            KeyboardButton::new(Module::UnitCircle.label()),
        ],
        vec![
            KeyboardButton::new(Module::Factoring.label()),
            KeyboardButton::new(Module::Derivatives.label()),
        ],
    ])
}

fn question_keyboard(question: &Question) -> KeyboardMarkup {
    let mut rows = Vec::new();
    let options = question.options();
    if !options.is_empty() {
        rows.push(
            options
                .iter()
                .map(|option| KeyboardButton::new(option.to_string()))
                .collect::<Vec<_>>(),
        );
    }
    rows.push(vec![
        KeyboardButton::new(NEW_QUESTION),
        KeyboardButton::new(SETTINGS),
        KeyboardButton::new(MENU),
    ]);
    KeyboardMarkup::new(rows)
}

fn settings_keyboard(module: Module) -> KeyboardMarkup {
    let labels: Vec<Vec<&str>> = match module {
        Module::Arithmetic => vec![Operation::ALL.iter().map(Operation::label).collect()],
        Module::UnitCircle => vec![
            vec!["Degrees", "Radians"],
            vec!["Fractions", "Decimals"],
            vec!["Diagram on", "Diagram off"],
        ],
        Module::Factoring => FactoringKind::ALL
            .iter()
            .map(|kind| vec![kind.label()])
            .collect(),
        Module::Derivatives => DerivativeKind::ALL
            .iter()
            .map(|kind| vec![kind.label()])
            .collect(),
    };

    let mut rows: Vec<Vec<KeyboardButton>> = labels
        .into_iter()
        .map(|row| row.into_iter().map(KeyboardButton::new).collect())
        .collect();
    rows.push(vec![KeyboardButton::new(DONE)]);
    KeyboardMarkup::new(rows)
}

fn settings_hint(module: Module, config: &DrillConfig) -> String {
    match module {
        Module::Arithmetic => {
            let (min, max) = config.arithmetic.bounds();
            format!(
                "Numbers from {} to {}, operators: {}.\nTap an operator to toggle it or type e.g. \"range 1 12\". Tap {} when finished.",
                min,
                max,
                config.arithmetic.operators_summary(),
                DONE
            )
        }
        Module::UnitCircle => format!(
            "{}.\nType e.g. \"range 0 π/2\" (in the current angle units) to narrow the angles. Tap {} when finished.",
            config.unit_circle.summary(),
            DONE
        ),
        Module::Factoring => format!(
            "Currently: {}. Pick a problem type, then tap {}.",
            config.factoring.label(),
            DONE
        ),
        Module::Derivatives => format!(
            "Currently: {}. Pick a rule, then tap {}.",
            config.derivatives.label(),
            DONE
        ),
    }
}

async fn send_question(bot: &Bot, chat_id: ChatId, session: &Session) -> HandlerResult {
    let Some(question) = &session.current else {
        return Ok(());
    };

    let mut text = question.text.clone();
    if let Detail::UnitCircle(detail) = &question.detail {
        if session.config.unit_circle.show_diagram {
            text = format!("{}\n\n{}", detail.diagram_caption(), text);
        }
    }

    bot.send_message(chat_id, text)
        .reply_markup(question_keyboard(question))
        .await?;
    Ok(())
}

async fn start(bot: Bot, dialogue: DrillDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(module_keyboard())
        .await?;

    store(
        &dialogue,
        State::ChooseModule {
            session: Session::default(),
        },
    )
    .await;
    Ok(())
}

async fn receive_module_choice(
    bot: Bot,
    dialogue: DrillDialogue,
    mut session: Session,
    msg: Message,
) -> HandlerResult {
    let Some(module) = msg.text().and_then(Module::from_label) else {
        bot.send_message(msg.chat.id, "Please pick one of the modules")
            .reply_markup(module_keyboard())
            .await?;
        return Ok(());
    };

    session.next_question(module);
    store(&dialogue, State::Drill { session: session.clone() }).await;
    send_question(&bot, msg.chat.id, &session).await
}

async fn back_to_menu(
    bot: &Bot,
    dialogue: &DrillDialogue,
    session: Session,
    chat_id: ChatId,
) -> HandlerResult {
    bot.send_message(chat_id, format!("{}\nWhat next?", session.stats.summary()))
        .reply_markup(module_keyboard())
        .await?;
    store(dialogue, State::ChooseModule { session }).await;
    Ok(())
}

/// The session routed with an update may be older than the stored one once
/// an auto-advance has run; call with the chat lock held.
async fn reload_drill(dialogue: &DrillDialogue, routed: Session) -> Session {
    match dialogue.get().await {
        Ok(Some(State::Drill { session })) => session,
        Ok(_) => routed,
        Err(err) => {
            log::warn!(
                "Could not reload session for chat {}: {}",
                dialogue.chat_id().0,
                err
            );
            routed
        }
    }
}

async fn drill(
    bot: Bot,
    dialogue: DrillDialogue,
    session: Session,
    msg: Message,
    settings: Arc<Settings>,
    locks: Arc<ChatLocks>,
) -> HandlerResult {
    let _guard = locks.acquire(dialogue.chat_id()).await;
    let mut session = reload_drill(&dialogue, session).await;
    let Some(module) = session.module() else {
        return back_to_menu(&bot, &dialogue, session, msg.chat.id).await;
    };

    match msg.text() {
        Some(NEW_QUESTION) => {
            session.next_question(module);
            store(&dialogue, State::Drill { session: session.clone() }).await;
            send_question(&bot, msg.chat.id, &session).await?;
        }
        Some(SETTINGS) => {
            bot.send_message(msg.chat.id, settings_hint(module, &session.config))
                .reply_markup(settings_keyboard(module))
                .await?;
            store(&dialogue, State::Configure { session }).await;
        }
        Some(MENU) => {
            back_to_menu(&bot, &dialogue, session, msg.chat.id).await?;
        }
        Some(answer) => {
            let Some(verdict) = session.submit(answer) else {
                return Ok(());
            };
            let question_id = session.current.as_ref().map(|question| question.id);
            let reply = format!("{}\n{}", verdict.message(), session.stats.summary());
            store(&dialogue, State::Drill { session }).await;
            bot.send_message(msg.chat.id, reply).await?;

            match question_id {
                Some(question_id) if verdict.correct => schedule_next_question(
                    bot,
                    dialogue,
                    Arc::clone(&locks),
                    question_id,
                    settings.auto_advance,
                ),
                _ => {}
            }
        }
        None => {
            bot.send_message(msg.chat.id, "Please answer with text")
                .await?;
        }
    }
    Ok(())
}

async fn configure(
    bot: Bot,
    dialogue: DrillDialogue,
    mut session: Session,
    msg: Message,
    locks: Arc<ChatLocks>,
) -> HandlerResult {
    let _guard = locks.acquire(dialogue.chat_id()).await;
    let Some(module) = session.module() else {
        return back_to_menu(&bot, &dialogue, session, msg.chat.id).await;
    };

    match msg.text() {
        Some(DONE) => {
            // a configuration change always starts a fresh question
            session.next_question(module);
            store(&dialogue, State::Drill { session: session.clone() }).await;
            send_question(&bot, msg.chat.id, &session).await?;
        }
        Some(command) => {
            let reply = match session.config.apply(module, command) {
                Ok(summary) => summary,
                Err(err) => format!("{}\n{}", err, settings_hint(module, &session.config)),
            };
            store(&dialogue, State::Configure { session }).await;
            bot.send_message(msg.chat.id, reply)
                .reply_markup(settings_keyboard(module))
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please send a setting as text")
                .await?;
        }
    }
    Ok(())
}

/// Moves on to a new question after `delay`, unless the user has already
/// replaced or left the question in the meantime.
fn schedule_next_question(
    bot: Bot,
    dialogue: DrillDialogue,
    locks: Arc<ChatLocks>,
    question_id: u64,
    delay: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _guard = locks.acquire(dialogue.chat_id()).await;
        if let Err(err) = advance_if_current(bot, dialogue, question_id).await {
            log::warn!("Auto-advance after question #{} failed: {}", question_id, err);
        }
    });
}

/// Runs under the chat lock, so the session read here is the latest one.
async fn advance_if_current(bot: Bot, dialogue: DrillDialogue, question_id: u64) -> HandlerResult {
    let Some(State::Drill { mut session }) = dialogue.get().await? else {
        return Ok(());
    };
    if !session.advance_if_current(question_id) {
        return Ok(());
    }
    store(&dialogue, State::Drill { session: session.clone() }).await;
    send_question(&bot, dialogue.chat_id(), &session).await
}
