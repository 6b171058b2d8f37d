use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Health,
    Productivity,
    Finance,
    Personal,
    Study,
    Social,
    Creativity,
}

impl Category {
    pub fn all() -> Vec<Category> {
        vec![
            Category::Health,
            Category::Productivity,
            Category::Finance,
            Category::Personal,
            Category::Study,
            Category::Social,
            Category::Creativity,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Productivity => "productivity",
            Category::Finance => "finance",
            Category::Personal => "personal",
            Category::Study => "study",
            Category::Social => "social",
            Category::Creativity => "creativity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Health => "Health",
            Category::Productivity => "Productivity",
            Category::Finance => "Finance",
            Category::Personal => "Personal",
            Category::Study => "Study",
            Category::Social => "Social",
            Category::Creativity => "Creativity",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "health" => Ok(Category::Health),
            "productivity" => Ok(Category::Productivity),
            "finance" | "financial" => Ok(Category::Finance),
            "personal" => Ok(Category::Personal),
            "study" | "studies" => Ok(Category::Study),
            "social" => Ok(Category::Social),
            "creativity" => Ok(Category::Creativity),
            _ => {
                let names: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
                Err(anyhow::anyhow!(
                    "Unknown category '{}'. Use: {}",
                    s,
                    names.join(", ")
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(anyhow::anyhow!(
                "Unknown frequency '{}'. Use: daily, weekly, monthly",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub frequency: Frequency,
    pub goal: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

/// Fields a caller supplies when creating or editing a habit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub frequency: Frequency,
    pub goal: Option<String>,
}

impl NewHabit {
    pub const MIN_NAME_LEN: usize = 2;

    /// Trim text fields, drop blank optionals and check the name length.
    pub fn validated(self) -> anyhow::Result<Self> {
        let name = self.name.trim().to_string();
        if name.chars().count() < Self::MIN_NAME_LEN {
            anyhow::bail!(
                "Habit name must have at least {} characters",
                Self::MIN_NAME_LEN
            );
        }
        Ok(Self {
            name,
            description: non_blank(self.description),
            goal: non_blank(self.goal),
            ..self
        })
    }
}

impl From<&Habit> for NewHabit {
    fn from(h: &Habit) -> Self {
        Self {
            name: h.name.clone(),
            description: h.description.clone(),
            category: h.category,
            frequency: h.frequency,
            goal: h.goal.clone(),
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitFilter {
    pub category: Option<Category>,
    pub is_active: Option<bool>,
}

impl HabitFilter {
    pub fn matches(&self, habit: &Habit) -> bool {
        self.category.is_none_or(|c| habit.category == c)
            && self.is_active.is_none_or(|a| habit.is_active == a)
    }
}
