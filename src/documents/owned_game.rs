use serde::{Deserialize, Serialize};
use std::fmt;

use super::CatalogueItem;

/// Document type under 'users/{user_id}/games/{item_id}' for a game in the
/// user's library, with the user's achievement state for it.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct OwnedGame {
    /// Id of the catalogue item the game was bought as.
    pub id: String,
    pub title: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub purchased_at: i64,

    #[serde(default)]
    pub playtime_minutes: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<i64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<Achievement>,
}

impl OwnedGame {
    pub fn new(item: &CatalogueItem, now: i64) -> Self {
        OwnedGame {
            id: item.id.clone(),
            title: item.title.clone(),
            platforms: item.platforms.clone(),
            image_url: item.image_url.clone(),
            purchased_at: now,
            achievements: item
                .achievements
                .iter()
                .map(|template| Achievement {
                    id: template.id.clone(),
                    title: template.title.clone(),
                    description: template.description.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn unlocked(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

impl fmt::Display for OwnedGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnedGame({}): '{}'", &self.id, &self.title)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub unlocked: bool,

    /// Percent progress towards unlocking, 0-100.
    #[serde(default)]
    pub progress: u8,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<i64>,
}

impl Achievement {
    /// Moves progress to `progress` percent, clamped to 100. Reaching 100
    /// unlocks the achievement. Progress of an unlocked achievement never
    /// regresses. Returns true if the achievement changed.
    pub fn set_progress(&mut self, progress: u8, now: i64) -> bool {
        if self.unlocked {
            return false;
        }

        let progress = progress.min(100);
        if progress == self.progress {
            return false;
        }

        self.progress = progress;
        if progress == 100 {
            self.unlocked = true;
            self.unlocked_at = Some(now);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::AchievementTemplate;

    fn achievement() -> Achievement {
        Achievement {
            id: "victory".to_owned(),
            title: "Victory Royale".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn new_owned_game_has_locked_achievements() {
        let item = CatalogueItem {
            id: "fortnite".to_owned(),
            title: "Fortnite".to_owned(),
            achievements: vec![AchievementTemplate {
                id: "victory".to_owned(),
                title: "Victory Royale".to_owned(),
                description: "Win your first match".to_owned(),
            }],
            ..Default::default()
        };

        let game = OwnedGame::new(&item, 42);
        assert_eq!(game.id, "fortnite");
        assert_eq!(game.purchased_at, 42);
        assert_eq!(game.achievements.len(), 1);
        assert!(!game.achievements[0].unlocked);
        assert_eq!(game.achievements[0].progress, 0);
        assert_eq!(game.unlocked(), 0);
    }

    #[test]
    fn progress_unlocks_at_100() {
        let mut achievement = achievement();

        assert!(achievement.set_progress(40, 1));
        assert!(!achievement.unlocked);

        assert!(achievement.set_progress(250, 2));
        assert_eq!(achievement.progress, 100);
        assert!(achievement.unlocked);
        assert_eq!(achievement.unlocked_at, Some(2));
    }

    #[test]
    fn unlocked_achievement_never_regresses() {
        let mut achievement = achievement();
        achievement.set_progress(100, 1);

        assert!(!achievement.set_progress(10, 2));
        assert_eq!(achievement.progress, 100);
        assert_eq!(achievement.unlocked_at, Some(1));
    }

    #[test]
    fn same_progress_is_no_change() {
        let mut achievement = achievement();
        assert!(!achievement.set_progress(0, 1));
    }
}
