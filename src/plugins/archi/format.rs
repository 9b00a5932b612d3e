//! The texts posted by the archi plugin.
use crate::archi::{AlertKind, MemberId, MonsterTimer, RepopAlert, TimerError};

use chrono::{DateTime, Duration, FixedOffset};

use std::fmt::Write;

/// Daily totals below this are a calm day.
const TIER_GOOD: i64 = 10;
/// Daily totals from this on are a great day.
const TIER_GREAT: i64 = 30;

/// Formats a wall-clock time as `HH:MM`.
pub fn time(datetime: &DateTime<FixedOffset>) -> String {
    datetime.format("%H:%M").to_string()
}

/// Formats a positive duration as `3h05`, `45 min` or `< 1 min`.
pub fn remaining(duration: Duration) -> String {
    let minutes = duration.num_minutes();

    match minutes {
        m if m >= 60 => format!("{}h{:02}", m / 60, m % 60),
        m if m >= 1 => format!("{} min", m),
        _ => String::from("< 1 min"),
    }
}

fn window(timer: &MonsterTimer) -> String {
    format!(
        "🟢 Début repop : {}\n🔴 Fin repop : {}",
        time(&timer.repop_start()),
        time(&timer.repop_end())
    )
}

fn mention(member: MemberId) -> String {
    format!("<@{}>", member)
}

pub fn registered(
    timer: &MonsterTimer,
    points: Option<i64>,
    previous: Option<&MonsterTimer>,
) -> String {
    let mut string = format!("📝 **{} enregistré !**\n{}", timer.display_name, window(timer));

    if let Some(points) = points {
        let _ = write!(string, "\n🏅 +{} point{}", points, plural(points));
        if timer.is_rare {
            string.push_str(" (archi rare !)");
        }
    }

    if let Some(previous) = previous {
        let _ = write!(
            string,
            "\n♻️ Remplace la capture de {} ({})",
            previous.captured_by.name(),
            time(&previous.capture_time)
        );
    }

    string
}

pub fn timer_status(timer: &MonsterTimer, now: DateTime<FixedOffset>) -> String {
    let status = if now < timer.repop_start() {
        format!("⏳ Repop dans {}", remaining(timer.repop_start() - now))
    } else if now <= timer.repop_end() {
        format!(
            "🚨 Repop en cours, encore {}",
            remaining(timer.repop_end() - now)
        )
    } else {
        String::from("💤 Fenêtre de repop terminée")
    };

    format!(
        "⏱️ **{}** capturé à {} par {}\n{}\n{}",
        timer.display_name,
        time(&timer.capture_time),
        timer.captured_by.name(),
        window(timer),
        status
    )
}

pub fn timer_error(name: &str, err: TimerError) -> String {
    match err {
        TimerError::NotFound => format!("❌ Aucun timer pour **{}**.", name),
        TimerError::Stale => format!(
            "⌛ Le timer de **{}** a plus de 24h, il n'est plus fiable.",
            name
        ),
    }
}

pub fn repops(
    active: &[MonsterTimer],
    upcoming: &[MonsterTimer],
    now: DateTime<FixedOffset>,
) -> String {
    if active.is_empty() && upcoming.is_empty() {
        return String::from("😴 Aucun repop en cours.");
    }

    let mut string = String::new();

    match active.is_empty() {
        true => string.push_str("😴 Aucun repop en cours.\n"),
        false => {
            let _ = writeln!(string, "🚨 **Repops en cours :**");
            for timer in active {
                let _ = writeln!(
                    string,
                    "- {}{} : jusqu'à {}",
                    rare_marker(timer),
                    timer.display_name,
                    time(&timer.repop_end())
                );
            }
        }
    }

    if !upcoming.is_empty() {
        let _ = writeln!(string, "⏳ **À venir :**");
        for timer in upcoming {
            let _ = writeln!(
                string,
                "- {}{} : à partir de {} (dans {})",
                rare_marker(timer),
                timer.display_name,
                time(&timer.repop_start()),
                remaining(timer.repop_start() - now)
            );
        }
    }

    string.trim_end().to_owned()
}

pub fn deleted(timer: &MonsterTimer, revoked: Option<(MemberId, i64)>) -> String {
    let mut string = format!("🗑️ Timer de **{}** supprimé.", timer.display_name);

    if let Some((member, points)) = revoked {
        let _ = write!(
            string,
            "\n➖ {} point{} retiré{} à {}",
            points,
            plural(points),
            plural(points),
            mention(member)
        );
    }

    string
}

pub fn leaderboard(entries: &[(MemberId, i64)]) -> String {
    if entries.is_empty() {
        return String::from("Personne n'a encore marqué de points cette semaine.");
    }

    let mut string = String::new();
    for (i, (member, points)) in entries.iter().enumerate() {
        let place = match i {
            0 => String::from("🥇"),
            1 => String::from("🥈"),
            2 => String::from("🥉"),
            i => format!("{}.", i + 1),
        };

        let _ = writeln!(
            string,
            "{} {} : {} point{}",
            place,
            mention(*member),
            points,
            plural(*points)
        );
    }

    string.trim_end().to_owned()
}

pub fn daily_total(total: i64) -> String {
    let comment = match total {
        t if t < TIER_GOOD => "🐢 Journée tranquille, on peut mieux faire !",
        t if t < TIER_GREAT => "💪 Belle chasse aujourd'hui !",
        _ => "🔥 Journée légendaire, la guilde est en feu !",
    };

    format!(
        "📊 **{}** point{} d'archis aujourd'hui.\n{}",
        total,
        plural(total),
        comment
    )
}

pub fn alert(alert: &RepopAlert) -> String {
    let timer = &alert.timer;

    match alert.kind {
        AlertKind::Common => format!(
            "🚨 **Début du repop de {} !**\n⏳ Jusqu'à {}",
            timer.display_name,
            time(&timer.repop_end())
        ),
        AlertKind::Rare => format!(
            "@here 🔥🚨 **ARCHI RARE : début du repop de {} !**\n⏳ Jusqu'à {}, ne le ratez pas !",
            timer.display_name,
            time(&timer.repop_end())
        ),
    }
}

pub fn cycle_winner(winner: (MemberId, i64), standings: &[(MemberId, i64)]) -> String {
    format!(
        "🏆 **Fin de la semaine !** {} remporte le titre avec {} point{} !\n\n{}",
        mention(winner.0),
        winner.1,
        plural(winner.1),
        leaderboard(standings)
    )
}

fn rare_marker(timer: &MonsterTimer) -> &'static str {
    match timer.is_rare {
        true => "🔥 ",
        false => "",
    }
}

fn plural(n: i64) -> &'static str {
    match n.abs() > 1 {
        true => "s",
        false => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archi::Capturer;

    fn timer(rare: bool) -> MonsterTimer {
        MonsterTimer {
            name: String::from("bulgig"),
            display_name: String::from("Bulgig"),
            capture_time: DateTime::parse_from_rfc3339("2024-01-01T10:00:00+01:00").unwrap(),
            captured_by: Capturer::member(111, "Robin"),
            is_rare: rare,
            alerted: false,
        }
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining(Duration::minutes(185)), "3h05");
        assert_eq!(remaining(Duration::minutes(60)), "1h00");
        assert_eq!(remaining(Duration::minutes(45)), "45 min");
        assert_eq!(remaining(Duration::seconds(20)), "< 1 min");
    }

    #[test]
    fn test_registered() {
        let text = registered(&timer(true), Some(5), None);

        assert!(text.starts_with("📝 **Bulgig enregistré !**"));
        assert!(text.contains("Début repop : 20:00"));
        assert!(text.contains("Fin repop : 00:00"));
        assert!(text.contains("+5 points (archi rare !)"));
        assert!(!text.contains("Remplace"));

        let external = registered(&timer(false), None, Some(&timer(false)));
        assert!(!external.contains("point"));
        assert!(external.contains("Remplace la capture de Robin (10:00)"));
    }

    #[test]
    fn test_timer_status() {
        let timer = timer(false);
        let capture = timer.capture_time;

        assert!(timer_status(&timer, capture + Duration::hours(7)).contains("Repop dans 3h00"));
        assert!(timer_status(&timer, capture + Duration::hours(11))
            .contains("Repop en cours, encore 3h00"));
        assert!(timer_status(&timer, capture + Duration::hours(15)).contains("terminée"));
    }

    #[test]
    fn test_repops() {
        let now = timer(false).capture_time + Duration::hours(11);

        assert_eq!(repops(&[], &[], now), "😴 Aucun repop en cours.");

        let text = repops(&[timer(true)], &[], now);
        assert!(text.contains("- 🔥 Bulgig : jusqu'à 00:00"));
        assert!(!text.contains("À venir"));
    }

    #[test]
    fn test_leaderboard() {
        assert_eq!(
            leaderboard(&[(1, 7), (2, 1), (3, 1), (4, 1)]),
            "🥇 <@1> : 7 points\n🥈 <@2> : 1 point\n🥉 <@3> : 1 point\n4. <@4> : 1 point"
        );
    }

    #[test]
    fn test_daily_total_tiers() {
        assert!(daily_total(0).contains("tranquille"));
        assert!(daily_total(9).contains("tranquille"));
        assert!(daily_total(10).contains("Belle chasse"));
        assert!(daily_total(29).contains("Belle chasse"));
        assert!(daily_total(30).contains("légendaire"));
    }

    #[test]
    fn test_alert() {
        let common = RepopAlert {
            timer: timer(false),
            kind: AlertKind::Common,
        };
        let rare = RepopAlert {
            timer: timer(true),
            kind: AlertKind::Rare,
        };

        assert_eq!(
            alert(&common),
            "🚨 **Début du repop de Bulgig !**\n⏳ Jusqu'à 00:00"
        );
        assert!(alert(&rare).starts_with("@here"));
    }
}
