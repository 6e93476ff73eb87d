use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The chat models offered by the configurable session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// GPT-3.5 Turbo; the fixed model of the basic session.
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,

    /// GPT-4
    #[serde(rename = "gpt-4")]
    Gpt4,
}

impl Model {
    /// Every selectable model, in menu order.
    pub const ALL: [Model; 2] = [Model::Gpt35Turbo, Model::Gpt4];

    /// The identifier sent to the completion service.
    pub fn id(&self) -> &'static str {
        match self {
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::Gpt4 => "gpt-4",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Model::ALL
            .into_iter()
            .find(|model| model.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let choices = Model::ALL.map(|m| m.id()).join(", ");
                format!("unknown model {s}; choose one of: {choices}")
            })
    }
}
