pub mod store;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use teloxide::utils::html;

pub use store::{RecordStore, StoreConfig};

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DoshaEffect {
    pub vata: String,
    pub pitta: String,
    pub kapha: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub name_sanskrit: Option<String>,
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub calories_per_100g: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    pub rasa: Option<Vec<String>>,
    pub guna: Option<Vec<String>>,
    pub virya: Option<String>,
    pub vipaka: Option<String>,
    pub dosha_effect: Option<DoshaEffect>,
    pub health_benefits: Option<Vec<String>>,
    pub image_url: Option<String>,
}

impl Food {
    fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self
                .name_sanskrit
                .as_ref()
                .is_some_and(|s| s.to_lowercase().contains(&query))
    }

    fn matches_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.category == category
    }
}

/// Read-only view over the food records, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct FoodCatalog {
    foods: Vec<Food>,
}

impl FoodCatalog {
    pub fn new(mut foods: Vec<Food>) -> Self {
        foods.sort_by(|a, b| a.name.cmp(&b.name));
        Self { foods }
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        let foods: Vec<Food> = serde_json::from_reader(reader)?;
        Ok(Self::new(foods))
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file))?)
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// `all` followed by every distinct category in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for food in &self.foods {
            if !categories.contains(&food.category) {
                categories.push(food.category.clone());
            }
        }
        categories
    }

    pub fn filter<'a>(&'a self, query: &str, category: &str) -> Vec<&'a Food> {
        self.foods
            .iter()
            .filter(|food| food.matches_search(query) && food.matches_category(category))
            .collect()
    }

    /// Case-insensitive lookup by English or Sanskrit name.
    pub fn find_by_name(&self, name: &str) -> Option<&Food> {
        let name = name.trim().to_lowercase();
        self.foods.iter().find(|food| {
            food.name.to_lowercase() == name
                || food
                    .name_sanskrit
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase() == name)
        })
    }
}

fn effect_arrow(effect: &str) -> &'static str {
    match effect {
        "increases" => "↑",
        "decreases" => "↓",
        _ => "=",
    }
}

fn format_grams(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn render_entry(food: &Food) -> String {
    let mut line = format!("<b>{}</b>", html::escape(&food.name));
    if let Some(sanskrit) = &food.name_sanskrit {
        line.push_str(&format!(" <i>{}</i>", html::escape(sanskrit)));
    }
    line.push_str(&format!(
        " · {} · {} cal/100g",
        html::escape(&food.category),
        format_grams(food.calories_per_100g)
    ));
    line
}

pub fn render_detail(food: &Food) -> String {
    let mut sections = vec![];

    let mut title = format!("<b>{}</b>", html::escape(&food.name));
    if let Some(sanskrit) = &food.name_sanskrit {
        title.push_str(&format!("\n<i>{}</i>", html::escape(sanskrit)));
    }
    sections.push(title);

    if let Some(description) = &food.description {
        sections.push(html::escape(description));
    }

    sections.push(format!(
        "<b>Modern Nutrition</b>\nCalories: {} per 100g\nProtein: {}g\nCarbs: {}g\nFat: {}g",
        format_grams(food.calories_per_100g),
        format_grams(food.protein_g),
        format_grams(food.carbs_g),
        format_grams(food.fat_g)
    ));

    let mut properties = vec![];
    if let Some(rasa) = food.rasa.as_ref().filter(|r| !r.is_empty()) {
        properties.push(format!("Rasa (Taste): {}", html::escape(&rasa.join(", "))));
    }
    if let Some(virya) = &food.virya {
        properties.push(format!("Virya: {}", html::escape(virya)));
    }
    if let Some(vipaka) = &food.vipaka {
        properties.push(format!("Vipaka: {}", html::escape(vipaka)));
    }
    if !properties.is_empty() {
        sections.push(format!("<b>Ayurvedic Properties</b>\n{}", properties.join("\n")));
    }

    if let Some(effect) = &food.dosha_effect {
        sections.push(format!(
            "<b>Dosha Effects</b>\nVata {} · Pitta {} · Kapha {}",
            effect_arrow(&effect.vata),
            effect_arrow(&effect.pitta),
            effect_arrow(&effect.kapha)
        ));
    }

    if let Some(benefits) = food.health_benefits.as_ref().filter(|b| !b.is_empty()) {
        let list = benefits
            .iter()
            .map(|b| format!("• {}", html::escape(b)))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("<b>Health Benefits</b>\n{}", list));
    }

    sections.join("\n\n")
}
