mod config;
mod foods;
mod guide;
mod quiz;

use std::sync::Arc;

use dotenv::dotenv;
use foods::{FoodCatalog, RecordStore};
use guide::{ChatHistory, ChatMessage, Role, WellnessGuide};
use quiz::{DoshaScores, QuizSession, Questionnaire};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, ParseMode},
};

use crate::config::Config;

type WellnessDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveFullName,
    ReceiveMenuChoice {
        profile: Option<DoshaScores>,
    },
    PrakritiQuiz {
        session: QuizSession,
        profile: Option<DoshaScores>,
    },
    FoodBrowser {
        profile: Option<DoshaScores>,
        category: String,
    },
    WellnessChat {
        profile: DoshaScores,
        history: ChatHistory,
    },
}

type UserInfoStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> HandlerResult {
    // Best-effort .env load; the variables may come from the real environment
    let _ = dotenv();

    pretty_env_logger::init();
    log::info!("Starting AyurWell bot...");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.dialogue_db_path);
    let storage: UserInfoStorage = SqliteStorage::open(&config.dialogue_db_path, Json)
        .await?
        .erase();

    let questionnaire = match &config.questions_path {
        Some(path) => {
            log::info!("Loading questions from {}", path.display());
            Questionnaire::from_path(path)?
        }
        None => Questionnaire::builtin()?,
    };
    log::info!(
        "Loaded {} questions, scoring mode {:?}",
        questionnaire.len(),
        config.scoring_mode
    );

    let catalog = load_catalog(&config).await;
    log::info!("Food catalog holds {} records", catalog.len());

    let questionnaire = Arc::new(questionnaire);
    let catalog = Arc::new(catalog);
    let guide = Arc::new(WellnessGuide::new());
    let config = Arc::new(config);

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveFullName].endpoint(receive_full_name))
            .branch(dptree::case![State::ReceiveMenuChoice { profile }].endpoint(receive_menu_choice))
            .branch(dptree::case![State::PrakritiQuiz { session, profile }].endpoint(prakriti_quiz))
            .branch(dptree::case![State::FoodBrowser { profile, category }].endpoint(food_browser))
            .branch(dptree::case![State::WellnessChat { profile, history }].endpoint(wellness_chat)),
    )
    .dependencies(dptree::deps![storage, questionnaire, catalog, guide, config])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

/// Fetches the food records once at startup. A failing source leaves the
/// catalog empty rather than stopping the bot.
async fn load_catalog(config: &Config) -> FoodCatalog {
    if let Some(store_config) = &config.store {
        let fetched = match RecordStore::new(store_config.clone()) {
            Ok(store) => store.fetch_foods().await,
            Err(e) => Err(e),
        };
        return match fetched {
            Ok(foods) => FoodCatalog::new(foods),
            Err(e) => {
                log::error!("Error loading foods from the record store: {}", e);
                FoodCatalog::default()
            }
        };
    }

    if config.foods_path.exists() {
        return match FoodCatalog::from_path(&config.foods_path) {
            Ok(catalog) => catalog,
            Err(e) => {
                log::error!(
                    "Error loading foods from {}: {}",
                    config.foods_path.display(),
                    e
                );
                FoodCatalog::default()
            }
        };
    }

    log::warn!("No food source configured, the food database will be empty");
    FoodCatalog::default()
}

const GREETING_TEXT: &str = "Namaste! I am the AyurWell bot. I will help you discover your Prakriti, your unique Ayurvedic constitution. Let's get acquainted! What is your name?";
async fn start(bot: Bot, dialogue: WellnessDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    dialogue.update(State::ReceiveFullName).await?;
    Ok(())
}

const TAKE_ASSESSMENT: &str = "Take the Prakriti assessment";
const MY_PROFILE: &str = "My Prakriti profile";
const FOOD_DATABASE: &str = "Food database";
const ASK_GUIDE: &str = "Ask AyurWell AI";
const BACK_TO_MENU: &str = "Back to menu";

fn menu_keyboard(profile: Option<&DoshaScores>) -> KeyboardMarkup {
    let mut rows = vec![vec![KeyboardButton::new(TAKE_ASSESSMENT)]];
    if profile.is_some() {
        rows.push(vec![KeyboardButton::new(MY_PROFILE)]);
        rows.push(vec![
            KeyboardButton::new(FOOD_DATABASE),
            KeyboardButton::new(ASK_GUIDE),
        ]);
    } else {
        rows.push(vec![KeyboardButton::new(FOOD_DATABASE)]);
    }
    KeyboardMarkup::new(rows)
}

async fn show_menu(
    bot: &Bot,
    dialogue: &WellnessDialogue,
    msg: &Message,
    profile: Option<DoshaScores>,
) -> HandlerResult {
    bot.send_message(msg.chat.id, "What would you like to do?")
        .reply_markup(menu_keyboard(profile.as_ref()))
        .await?;

    dialogue.update(State::ReceiveMenuChoice { profile }).await?;
    Ok(())
}

async fn receive_full_name(bot: Bot, dialogue: WellnessDialogue, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(full_name) => {
            bot.send_message(msg.chat.id, format!("Nice to meet you, {}!", full_name))
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please tell me your name (as text)")
                .await?;
            return Ok(());
        }
    }

    show_menu(&bot, &dialogue, &msg, None).await
}

async fn receive_menu_choice(
    bot: Bot,
    dialogue: WellnessDialogue,
    profile: Option<DoshaScores>,
    questionnaire: Arc<Questionnaire>,
    catalog: Arc<FoodCatalog>,
    config: Arc<Config>,
    msg: Message,
) -> HandlerResult {
    match (msg.text(), profile) {
        (Some(TAKE_ASSESSMENT), _) => {
            let session = QuizSession::new(config.scoring_mode);
            log::debug!(
                "Chat {} started an assessment in {:?} mode",
                msg.chat.id,
                session.mode()
            );

            bot.send_message(
                msg.chat.id,
                format!(
                    "<b>Prakriti Assessment</b>\nDiscover your unique Ayurvedic constitution.\n\n{}",
                    quiz::profile::render_dosha_legend()
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            send_question(&bot, &msg, &session, &questionnaire).await?;

            dialogue
                .update(State::PrakritiQuiz { session, profile })
                .await?;
        }
        (Some(MY_PROFILE), Some(scores)) => {
            send_results(&bot, &msg, &scores).await?;
        }
        (Some(FOOD_DATABASE), _) => {
            enter_food_browser(&bot, &dialogue, &msg, &catalog, profile).await?;
        }
        (Some(ASK_GUIDE), Some(scores)) => {
            let percentages = match quiz::scores::normalize(&scores) {
                Ok(percentages) => percentages,
                Err(e) => {
                    log::warn!("Chat {} has an unusable profile: {}", msg.chat.id, e);
                    bot.send_message(msg.chat.id, "Please retake the assessment first.")
                        .await?;
                    return Ok(());
                }
            };

            let greeting = guide::greeting(&percentages);
            let mut history = ChatHistory::new(config.chat_history_limit);
            history.push(ChatMessage::new(Role::Assistant, greeting.clone()));

            bot.send_message(msg.chat.id, greeting)
                .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
                    BACK_TO_MENU,
                )]]))
                .await?;
            bot.send_message(
                msg.chat.id,
                "AI responses are for educational purposes. Consult a practitioner for personalized advice.",
            )
            .await?;

            dialogue
                .update(State::WellnessChat {
                    profile: scores,
                    history,
                })
                .await?;
        }
        (Some(MY_PROFILE | ASK_GUIDE), None) => {
            bot.send_message(msg.chat.id, "Please take the assessment first.")
                .reply_markup(menu_keyboard(None))
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(menu_keyboard(profile.as_ref()))
                .await?;
        }
    }
    Ok(())
}

const PREVIOUS: &str = "⬅ Previous";
const NEXT: &str = "Next ➡";
const COMPLETE: &str = "Complete ✅";

async fn send_question(
    bot: &Bot,
    msg: &Message,
    session: &QuizSession,
    questionnaire: &Questionnaire,
) -> HandlerResult {
    let (Some(text), Some(question)) = (
        quiz::profile::render_question(session, questionnaire),
        session.index().and_then(|i| questionnaire.get(i)),
    ) else {
        return Ok(());
    };

    let mut rows = question
        .answers
        .iter()
        .map(|a| vec![KeyboardButton::new(a.text.clone())])
        .collect::<Vec<_>>();

    let is_last = session.index() == Some(questionnaire.len() - 1);
    rows.push(vec![
        KeyboardButton::new(PREVIOUS),
        KeyboardButton::new(if is_last { COMPLETE } else { NEXT }),
    ]);
    rows.push(vec![KeyboardButton::new(BACK_TO_MENU)]);

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn send_results(bot: &Bot, msg: &Message, scores: &DoshaScores) -> HandlerResult {
    match quiz::profile::render_results(scores) {
        Ok(text) => {
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(e) => {
            log::warn!("Cannot render results for chat {}: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, "Your answers did not produce a score.")
                .await?;
        }
    }
    Ok(())
}

async fn prakriti_quiz(
    bot: Bot,
    dialogue: WellnessDialogue,
    (session, profile): (QuizSession, Option<DoshaScores>),
    questionnaire: Arc<Questionnaire>,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please choose one of the options")
            .await?;
        return Ok(());
    };

    let transition = match text {
        BACK_TO_MENU => {
            log::debug!("Chat {} abandoned the assessment", msg.chat.id);
            return show_menu(&bot, &dialogue, &msg, profile).await;
        }
        PREVIOUS => session.retreat(),
        NEXT | COMPLETE => session.advance(&questionnaire),
        answer => {
            let current = session.index().and_then(|i| questionnaire.get(i));
            let option = current.and_then(|q| q.answers.iter().position(|a| a.text == answer));
            match option {
                Some(option) => session.select_option(&questionnaire, option),
                None => {
                    bot.send_message(msg.chat.id, "Please choose one of the options")
                        .await?;
                    return Ok(());
                }
            }
        }
    };

    let next = match transition {
        Ok(next) => next,
        Err(e) => {
            log::warn!("Rejected quiz step for chat {}: {}", msg.chat.id, e);
            let hint = match e {
                quiz::NavigationError::NoSelection => "Please select an answer first.",
                quiz::NavigationError::AtFirstQuestion => "This is already the first question.",
                _ => "That is not possible right now.",
            };
            bot.send_message(msg.chat.id, hint).await?;
            return Ok(());
        }
    };

    log::debug!("Chat {} quiz moved to {:?}", msg.chat.id, next.state());

    if let Some(scores) = next.final_scores() {
        log::info!(
            "Chat {} completed the assessment after {} answers: {:?}",
            msg.chat.id,
            next.commits().len(),
            scores
        );
        send_results(&bot, &msg, &scores).await?;
        return show_menu(&bot, &dialogue, &msg, Some(scores)).await;
    }

    send_question(&bot, &msg, &next, &questionnaire).await?;
    dialogue
        .update(State::PrakritiQuiz {
            session: next,
            profile,
        })
        .await?;
    Ok(())
}

const ALL_CATEGORIES_LABEL: &str = "All categories";
const MAX_LISTED_FOODS: usize = 25;

fn category_keyboard(catalog: &FoodCatalog) -> KeyboardMarkup {
    let mut rows = catalog
        .categories()
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|c| {
                    if c == foods::ALL_CATEGORIES {
                        KeyboardButton::new(ALL_CATEGORIES_LABEL)
                    } else {
                        KeyboardButton::new(c.clone())
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(BACK_TO_MENU)]);
    KeyboardMarkup::new(rows)
}

async fn enter_food_browser(
    bot: &Bot,
    dialogue: &WellnessDialogue,
    msg: &Message,
    catalog: &FoodCatalog,
    profile: Option<DoshaScores>,
) -> HandlerResult {
    if catalog.is_empty() {
        bot.send_message(msg.chat.id, "The food database is not available right now.")
            .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        "Type a food name to search, or pick a category.",
    )
    .reply_markup(category_keyboard(catalog))
    .await?;

    dialogue
        .update(State::FoodBrowser {
            profile,
            category: foods::ALL_CATEGORIES.to_string(),
        })
        .await?;
    Ok(())
}

async fn send_food_list(bot: &Bot, msg: &Message, matches: &[&foods::Food]) -> HandlerResult {
    if matches.is_empty() {
        bot.send_message(msg.chat.id, "No foods found matching your criteria")
            .await?;
        return Ok(());
    }

    let mut text = matches
        .iter()
        .take(MAX_LISTED_FOODS)
        .map(|f| foods::render_entry(f))
        .collect::<Vec<_>>()
        .join("\n");
    if matches.len() > MAX_LISTED_FOODS {
        text.push_str(&format!(
            "\n\n…and {} more, refine your search",
            matches.len() - MAX_LISTED_FOODS
        ));
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn food_browser(
    bot: Bot,
    dialogue: WellnessDialogue,
    (profile, category): (Option<DoshaScores>, String),
    catalog: Arc<FoodCatalog>,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please type a food name")
            .await?;
        return Ok(());
    };

    if text == BACK_TO_MENU {
        return show_menu(&bot, &dialogue, &msg, profile).await;
    }

    let picked_category = if text == ALL_CATEGORIES_LABEL {
        Some(foods::ALL_CATEGORIES.to_string())
    } else {
        catalog
            .categories()
            .into_iter()
            .find(|c| c != foods::ALL_CATEGORIES && c == text)
    };
    if let Some(category) = picked_category {
        send_food_list(&bot, &msg, &catalog.filter("", &category)).await?;
        dialogue
            .update(State::FoodBrowser { profile, category })
            .await?;
        return Ok(());
    }

    if let Some(food) = catalog.find_by_name(text) {
        bot.send_message(msg.chat.id, foods::render_detail(food))
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    }

    send_food_list(&bot, &msg, &catalog.filter(text.trim(), &category)).await
}

async fn wellness_chat(
    bot: Bot,
    dialogue: WellnessDialogue,
    (profile, mut history): (DoshaScores, ChatHistory),
    guide: Arc<WellnessGuide>,
    config: Arc<Config>,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text == BACK_TO_MENU {
        return show_menu(&bot, &dialogue, &msg, Some(profile)).await;
    }

    let percentages = match quiz::scores::normalize(&profile) {
        Ok(percentages) => percentages,
        Err(e) => {
            log::warn!("Chat {} is chatting with an unusable profile: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, "Please retake the assessment first.")
                .await?;
            return show_menu(&bot, &dialogue, &msg, None).await;
        }
    };

    // Purely cosmetic, a failed chat action is not worth failing the reply
    let _ = bot
        .send_chat_action(msg.chat.id, ChatAction::Typing)
        .await;
    tokio::time::sleep(config.chat_reply_delay).await;

    let Some(reply) = guide.respond(&mut history, text, &percentages) else {
        return Ok(());
    };

    bot.send_message(msg.chat.id, reply).await?;

    dialogue
        .update(State::WellnessChat { profile, history })
        .await?;
    Ok(())
}
