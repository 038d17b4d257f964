use serde::Serialize;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

/// XP granted for a persisted photo solution.
pub const XP_PHOTO_SOLVE: i32 = 20;
/// XP granted when a video watch session is reported as completed.
pub const XP_VIDEO_COMPLETED: i32 = 50;
/// XP needed per level. Level 1 starts at 0 XP.
pub const XP_PER_LEVEL: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpUpdate {
    pub xp: i32,
    pub level: i32,
}

/// Level reached with `xp` total experience points.
pub fn level_for_xp(xp: i32) -> i32 {
    1 + xp.max(0) / XP_PER_LEVEL
}

/// XP granted for completing a quiz: the score itself, never negative.
pub fn quiz_xp(score: i32) -> i32 {
    score.max(0)
}

/// Adds `amount` XP and recomputes the level in one statement.
///
/// Takes a connection so callers can run it inside the transaction that
/// inserts the row earning the XP. Returns `None` when the user is gone.
pub async fn award_xp(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i32,
) -> Result<Option<XpUpdate>, sqlx::Error> {
    let row: Option<(i32, i32)> = sqlx::query_as(
        r#"
        UPDATE users
        SET xp = GREATEST(xp + $2, 0),
            level = 1 + GREATEST(xp + $2, 0) / $3
        WHERE id = $1
        RETURNING xp, level
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(XP_PER_LEVEL)
    .fetch_optional(conn)
    .await?;

    let update = row.map(|(xp, level)| XpUpdate { xp, level });
    if let Some(update) = update {
        info!(
            "Awarded {amount} XP to user {user_id} (xp={}, level={})",
            update.xp, update.level
        );
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_curve() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(499), 1);
        assert_eq!(level_for_xp(500), 2);
        assert_eq!(level_for_xp(1250), 3);
    }

    #[test]
    fn test_level_never_below_one() {
        assert_eq!(level_for_xp(-100), 1);
    }

    #[test]
    fn test_quiz_xp_clamps_negative_scores() {
        assert_eq!(quiz_xp(52), 52);
        assert_eq!(quiz_xp(-3), 0);
    }
}
