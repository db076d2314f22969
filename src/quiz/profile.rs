use teloxide::utils::html;

use crate::quiz::scores::{self, Dosha, DoshaScores, ResultPercentages, ScoreError};
use crate::quiz::{QuizSession, Questionnaire};

pub struct DoshaInfo {
    pub element: &'static str,
    pub qualities: [&'static str; 4],
    pub balance: &'static str,
    pub imbalance: &'static str,
}

pub fn dosha_info(dosha: Dosha) -> DoshaInfo {
    match dosha {
        Dosha::Vata => DoshaInfo {
            element: "Air & Space",
            qualities: ["Quick", "Creative", "Energetic", "Changeable"],
            balance: "Warm, grounding foods; regular routines; calming practices",
            imbalance: "Anxiety, dry skin, constipation, irregular digestion",
        },
        Dosha::Pitta => DoshaInfo {
            element: "Fire & Water",
            qualities: ["Intense", "Focused", "Leader", "Competitive"],
            balance: "Cooling foods; avoid spicy; moderate activity; stress management",
            imbalance: "Irritability, inflammation, acidity, skin rashes",
        },
        Dosha::Kapha => DoshaInfo {
            element: "Earth & Water",
            qualities: ["Stable", "Calm", "Nurturing", "Enduring"],
            balance: "Light, warm foods; regular exercise; variety and stimulation",
            imbalance: "Weight gain, lethargy, congestion, depression",
        },
    }
}

/// Short tagline shown under the quiz, one per dosha.
pub fn dosha_tagline(dosha: Dosha) -> &'static str {
    match dosha {
        Dosha::Vata => "Air & Space - Movement, creativity",
        Dosha::Pitta => "Fire & Water - Transformation, metabolism",
        Dosha::Kapha => "Earth & Water - Structure, stability",
    }
}

const BAR_WIDTH: usize = 20;

fn bar(percentage: i32) -> String {
    let filled = (percentage.clamp(0, 100) as usize * BAR_WIDTH + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// The question screen: position, progress, category, prompt and answers,
/// with the pending answer marked.
pub fn render_question(session: &QuizSession, questionnaire: &Questionnaire) -> Option<String> {
    let index = session.index()?;
    let question = questionnaire.get(index)?;
    let progress = (session.progress(questionnaire) * 100.0).round() as u32;

    let answers = question
        .answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let marker = if session.pending() == Some(i) { "●" } else { "○" };
            format!("{} {}", marker, html::escape(&answer.text))
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "Question {} of {} · {}%\n{}\n\n<i>{}</i>\n<b>{}</b>\n\n{}",
        index + 1,
        questionnaire.len(),
        progress,
        bar(progress as i32),
        html::escape(&question.category),
        html::escape(&question.text),
        answers
    ))
}

pub fn render_dosha_legend() -> String {
    Dosha::ALL
        .iter()
        .map(|dosha| format!("<b>{}</b>: {}", dosha, dosha_tagline(*dosha)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The result screen for a finished assessment.
pub fn render_results(scores: &DoshaScores) -> Result<String, ScoreError> {
    let percentages = scores::normalize(scores)?;
    let dominant = scores::dominant(scores);
    let info = dosha_info(dominant);

    Ok(format!(
        "<b>Your Prakriti Profile</b>\n\n{}\n\n<b>You are predominantly {}</b>\nElement: {}\n\n<b>Your Qualities</b>\n{}\n\n<b>Balance Through</b>\n{}\n\n<b>Watch for Imbalance</b>\n{}",
        render_distribution(&percentages, Some(dominant)),
        dominant,
        info.element,
        info.qualities.join(" · "),
        info.balance,
        info.imbalance
    ))
}

pub fn render_distribution(percentages: &ResultPercentages, dominant: Option<Dosha>) -> String {
    Dosha::ALL
        .iter()
        .map(|dosha| {
            let pct = percentages.get(*dosha);
            let tag = if dominant == Some(*dosha) { " (dominant)" } else { "" };
            format!("{:<6} {} {}%{}", dosha.name(), bar(pct), pct, tag)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
