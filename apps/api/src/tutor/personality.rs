//! Canned tutor content: personalities, emotions and Socratic turns.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityId {
    Empathetic,
    Socratic,
    Encouraging,
    Analytical,
}

impl PersonalityId {
    /// Unknown ids fall back to the empathetic teacher.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "socratic" => PersonalityId::Socratic,
            "encouraging" => PersonalityId::Encouraging,
            "analytical" => PersonalityId::Analytical,
            _ => PersonalityId::Empathetic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Personality {
    pub id: PersonalityId,
    pub name: &'static str,
    pub description: &'static str,
}

pub const PERSONALITIES: [Personality; 4] = [
    Personality {
        id: PersonalityId::Empathetic,
        name: "Empatik Öğretmen",
        description: "Sabırlı, destekleyici ve duygulara odaklanan bir öğretmen.",
    },
    Personality {
        id: PersonalityId::Socratic,
        name: "Sokratik Mentor",
        description: "Soru sorarak öğrencinin düşünmesini sağlayan rehber.",
    },
    Personality {
        id: PersonalityId::Encouraging,
        name: "Cesaretlendirici Koç",
        description: "Motivasyonu artıran ve öğrenme sürecini eğlenceli kılan bir koç.",
    },
    Personality {
        id: PersonalityId::Analytical,
        name: "Analitik Uzman",
        description: "Veri ve problem çözme odaklı, doğrudan geri bildirim veren uzman.",
    },
];

pub const EMOTIONS: [&str; 6] = ["mutlu", "üzgün", "heyecanlı", "kaygılı", "sakin", "kızgın"];

/// Templated reply for the personality chat.
pub fn personality_reply(personality: PersonalityId, message: &str) -> String {
    match personality {
        PersonalityId::Socratic => "Bu harika bir soru! Sen ne düşünüyorsun?".to_string(),
        PersonalityId::Encouraging => format!(
            "Çok iyi gidiyorsun! Devam et, {message} hakkında daha fazla düşünelim."
        ),
        PersonalityId::Analytical => format!(
            "{message} ifadesini adım adım analiz edelim. İlk olarak verilenleri not alalım."
        ),
        PersonalityId::Empathetic => format!(
            "Anladım, {message}. Bu konu hakkında neyin zor geldiğini biraz daha anlatır mısın?"
        ),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionGuess {
    pub emotion: &'static str,
    pub confidence: f64,
}

/// Random emotion with a confidence in [0.70, 0.99], 2 decimals.
pub fn guess_emotion<R: Rng + ?Sized>(rng: &mut R) -> EmotionGuess {
    let emotion = EMOTIONS.choose(rng).copied().unwrap_or("sakin");
    let confidence = (rng.gen_range(0.70..=0.99_f64) * 100.0).round() / 100.0;
    EmotionGuess {
        emotion,
        confidence,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SocraticTurn {
    pub message: &'static str,
    pub question_type: &'static str,
    pub emotion: &'static str,
}

const SOCRATIC_TURNS: [SocraticTurn; 3] = [
    SocraticTurn {
        message: "Bu çok iyi bir soru! Cevaba geçmeden önce kavramın ne anlama geldiğini düşünelim. Sence bu kavram nedir?",
        question_type: "clarifying",
        emotion: "encouraging",
    },
    SocraticTurn {
        message: "Harika başlangıç! Peki bu kavramın günlük hayatta nerelerde kullanıldığını düşünebilir misin?",
        question_type: "probing",
        emotion: "supportive",
    },
    SocraticTurn {
        message: "Mükemmel! Şimdi birlikte adım adım ilerleyelim. İlk olarak temel tanımı hatırlayalım. Bu konuda ne biliyorsun?",
        question_type: "foundation",
        emotion: "happy",
    },
];

pub const TUTOR_TIPS: [&str; 3] = [
    "Kendi cevabını bulmaya çalış",
    "Adım adım düşün",
    "Soruları sormaktan çekinme",
];

/// Socratic turn for a session that already has `prior_turns` turns.
/// Stays on the last (foundation) turn once the sequence is exhausted.
pub fn socratic_turn(prior_turns: i64) -> SocraticTurn {
    let idx = prior_turns.clamp(0, SOCRATIC_TURNS.len() as i64 - 1) as usize;
    SOCRATIC_TURNS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_personality() {
        assert_eq!(PersonalityId::parse("Socratic"), PersonalityId::Socratic);
        assert_eq!(PersonalityId::parse(" analytical "), PersonalityId::Analytical);
        assert_eq!(PersonalityId::parse("pirate"), PersonalityId::Empathetic);
    }

    #[test]
    fn test_personality_reply_embeds_message() {
        let reply = personality_reply(PersonalityId::Analytical, "2x+5=13");
        assert!(reply.starts_with("2x+5=13"));
        let socratic = personality_reply(PersonalityId::Socratic, "ignored");
        assert!(!socratic.contains("ignored"));
    }

    #[test]
    fn test_guess_emotion_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let guess = guess_emotion(&mut rng);
            assert!(EMOTIONS.contains(&guess.emotion));
            assert!((0.70..=0.99).contains(&guess.confidence));
        }
    }

    #[test]
    fn test_socratic_sequence() {
        assert_eq!(socratic_turn(0).question_type, "clarifying");
        assert_eq!(socratic_turn(1).question_type, "probing");
        assert_eq!(socratic_turn(2).question_type, "foundation");
        assert_eq!(socratic_turn(9).question_type, "foundation");
    }
}
