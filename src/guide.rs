use chrono::{DateTime, Utc};

use crate::quiz::{Dosha, ResultPercentages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Conversation so far, oldest first, capped at `limit` messages.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    limit: usize,
}

impl ChatHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.limit > 0 && self.messages.len() > self.limit {
            let overflow = self.messages.len() - self.limit;
            self.messages.drain(..overflow);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Opening message of a chat, quoting the user's profile.
pub fn greeting(percentages: &ResultPercentages) -> String {
    format!(
        "Namaste! I am AyurWell AI, your personal Ayurvedic wellness guide. Based on your Prakriti assessment, I see you have Vata at {}%, Pitta at {}%, and Kapha at {}%. How may I assist you with your wellness journey today?",
        percentages.vata, percentages.pitta, percentages.kapha
    )
}

/// The scripted AyurWell AI. Replies are picked by keyword, no model is
/// involved and nothing is learned between messages.
#[derive(Debug, Clone, Default)]
pub struct WellnessGuide;

impl WellnessGuide {
    pub fn new() -> Self {
        Self
    }

    /// Records the user's message and the reply in `history`. Blank input is
    /// ignored and yields `None`.
    pub fn respond(
        &self,
        history: &mut ChatHistory,
        input: &str,
        percentages: &ResultPercentages,
    ) -> Option<String> {
        if input.trim().is_empty() {
            return None;
        }
        history.push(ChatMessage::new(Role::User, input.to_string()));

        let reply = self.reply(input, percentages);
        log::debug!("Guide reply for {:?}: {} chars", input, reply.len());
        history.push(ChatMessage::new(Role::Assistant, reply.clone()));
        Some(reply)
    }

    pub fn reply(&self, input: &str, percentages: &ResultPercentages) -> String {
        let input = input.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| input.contains(k));
        let dominant = percentages.dominant();

        if mentions(&["food", "eat", "diet"]) {
            return diet_advice(dominant).to_string();
        }

        if mentions(&["dosha", "prakriti"]) {
            return format!(
                "Based on your assessment, your dominant dosha is {} at {}%.\n\nYour constitution represents:\n• Vata: {}% - Governs movement and creativity\n• Pitta: {}% - Governs metabolism and transformation\n• Kapha: {}% - Governs structure and stability\n\nThis unique blend influences your physical, mental, and emotional characteristics.",
                dominant,
                percentages.get(dominant),
                percentages.vata,
                percentages.pitta,
                percentages.kapha
            );
        }

        if mentions(&["sleep", "rest"]) {
            return SLEEP_ADVICE.to_string();
        }

        if mentions(&["stress", "anxiety"]) {
            return STRESS_ADVICE.to_string();
        }

        if mentions(&["exercise", "yoga"]) {
            return exercise_advice(dominant).to_string();
        }

        FALLBACK.to_string()
    }
}

fn diet_advice(dominant: Dosha) -> &'static str {
    match dominant {
        Dosha::Vata => "For Vata balance, I recommend warm, grounding foods:\n\n• Cooked grains like rice and oats\n• Root vegetables\n• Warm milk with spices\n• Ghee and healthy oils\n• Sweet, sour, and salty tastes\n\nAvoid cold, dry, or raw foods. Eat at regular times and in a calm environment.",
        Dosha::Pitta => "For Pitta balance, focus on cooling foods:\n\n• Sweet fruits like melons and grapes\n• Cooling vegetables like cucumber\n• Coconut water and milk\n• Ghee and sweet grains\n• Sweet, bitter, and astringent tastes\n\nAvoid spicy, sour, and salty foods. Eat at moderate temperature.",
        Dosha::Kapha => "For Kapha balance, choose light, warming foods:\n\n• Light grains like quinoa and barley\n• Leafy greens and vegetables\n• Legumes and beans\n• Warming spices\n• Pungent, bitter, and astringent tastes\n\nAvoid heavy, oily, or sweet foods. Practice mindful eating.",
    }
}

fn exercise_advice(dominant: Dosha) -> &'static str {
    match dominant {
        Dosha::Vata => "For Vata types, choose grounding exercises:\n\n• Gentle yoga and stretching\n• Walking in nature\n• Tai chi or qigong\n• Swimming\n\nAvoid excessive or erratic exercise. Focus on stability and calm.",
        Dosha::Pitta => "For Pitta types, moderate cooling activities:\n\n• Swimming and water sports\n• Moonlight walks\n• Moderate yoga\n• Non-competitive activities\n\nAvoid overheating or competitive intensity.",
        Dosha::Kapha => "For Kapha types, invigorating exercise:\n\n• Running or brisk walking\n• Dynamic yoga\n• Dance and aerobics\n• Strength training\n\nRegular vigorous exercise helps balance Kapha energy.",
    }
}

const SLEEP_ADVICE: &str = "Good sleep is essential for all doshas:\n\n• Vata: Go to bed by 10 PM, maintain routine\n• Pitta: Cool bedroom, avoid screens before bed\n• Kapha: Wake early, avoid excessive sleep\n\nTry warm milk with nutmeg, gentle oil massage, and calming breathwork before bed.";

const STRESS_ADVICE: &str = "Ayurveda offers beautiful practices for mental balance:\n\n• Meditation and pranayama (breathwork)\n• Daily oil massage (Abhyanga)\n• Herbal teas like Brahmi or Ashwagandha\n• Regular routine and sleep\n• Connection with nature\n\nRemember, your mind and body are interconnected. What you eat and how you live affects your mental state.";

const FALLBACK: &str = "Thank you for your question! I'm here to guide you on your Ayurvedic wellness journey. I can help with:\n\n• Personalized food recommendations\n• Understanding your dosha\n• Lifestyle and daily routines\n• Herbal remedies and natural healing\n• Exercise and yoga guidance\n• Seasonal adjustments\n\nWhat would you like to explore?";
