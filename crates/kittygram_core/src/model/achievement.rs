//! Achievement records and their links to cats.

/// Row id of an achievement.
pub type AchievementId = i64;

/// Named achievement. The name is the lookup identity for get-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
}

/// Join record materializing one cat/achievement edge.
///
/// Never updated in place: links are created on attach and removed when a
/// cat's achievement set is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementCat {
    pub id: i64,
    pub achievement_id: AchievementId,
    pub cat_id: crate::model::cat::CatId,
}
