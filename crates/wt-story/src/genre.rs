//! Genre flavor tags.
//!
//! A flavor tag is picked once per session and only perturbs the tone
//! instruction of the opening prompt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of story flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    /// Dread, gore and things in the dark.
    Horror,
    /// Slapstick Orky mayhem.
    Funny,
    /// Loot, exploration and scrapes.
    Adventure,
    /// Huge battles and legendary Warbosses.
    Epic,
    /// Plain grimdark brutality.
    #[default]
    Default,
}

impl Genre {
    /// All genres in display order.
    pub const ALL: [Genre; 5] = [
        Genre::Horror,
        Genre::Funny,
        Genre::Adventure,
        Genre::Epic,
        Genre::Default,
    ];

    /// Parse a genre name. Unknown names fall back to [`Genre::Default`].
    pub fn from_name(name: &str) -> Genre {
        match name.trim().to_lowercase().as_str() {
            "horror" => Genre::Horror,
            "funny" | "comedy" => Genre::Funny,
            "adventure" => Genre::Adventure,
            "epic" => Genre::Epic,
            _ => Genre::Default,
        }
    }

    /// Lowercase tag name.
    pub fn name(self) -> &'static str {
        match self {
            Genre::Horror => "horror",
            Genre::Funny => "funny",
            Genre::Adventure => "adventure",
            Genre::Epic => "epic",
            Genre::Default => "default",
        }
    }

    /// Tone clause folded into the opening prompt.
    pub fn flavor(self) -> &'static str {
        match self {
            Genre::Horror => {
                "Give the tale a horror tone: something stalks the warband in the dark, \
                 and even Orks feel the creeping dread."
            }
            Genre::Funny => {
                "Give the tale a funny tone: slapstick violence, dim-witted Grots, \
                 and plans that go hilariously wrong."
            }
            Genre::Adventure => {
                "Give the tale an adventurous tone: strange ruins, shiny loot, \
                 and narrow escapes across the battlefield."
            }
            Genre::Epic => {
                "Give the tale an epic tone: colossal battles, towering Gargants, \
                 and a Waaagh! that will be remembered for ages."
            }
            Genre::Default => "Keep the tone grim, brutal and chaotic.",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Genre::from_name(s))
    }
}
