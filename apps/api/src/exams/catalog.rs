//! Static exam catalogue and the practice-test question set.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ExamSystem {
    pub id: &'static str,
    pub name: &'static str,
}

pub const EXAM_SYSTEMS: [ExamSystem; 8] = [
    ExamSystem { id: "yks", name: "YKS" },
    ExamSystem { id: "lgs", name: "LGS" },
    ExamSystem { id: "kpss", name: "KPSS" },
    ExamSystem { id: "dgs", name: "DGS" },
    ExamSystem { id: "ales", name: "ALES" },
    ExamSystem { id: "ydt", name: "YDT" },
    ExamSystem { id: "msu", name: "MSÜ" },
    ExamSystem { id: "tyt", name: "TYT/AYT" },
];

#[derive(Debug, Clone, Serialize)]
pub struct ExamType {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub students: &'static str,
    pub active: bool,
}

pub const EXAM_TYPES: [ExamType; 6] = [
    ExamType {
        id: "yks",
        name: "YKS (TYT/AYT)",
        description: "Üniversite Sınavı",
        students: "500K+",
        active: true,
    },
    ExamType {
        id: "lgs",
        name: "LGS",
        description: "Lise Geçiş Sınavı",
        students: "300K+",
        active: true,
    },
    ExamType {
        id: "kpss",
        name: "KPSS",
        description: "Kamu Personel Sınavı",
        students: "200K+",
        active: true,
    },
    ExamType {
        id: "dgs",
        name: "DGS",
        description: "Dikey Geçiş Sınavı",
        students: "150K+",
        active: true,
    },
    ExamType {
        id: "ales",
        name: "ALES",
        description: "Lisansüstü Sınavı",
        students: "100K+",
        active: true,
    },
    ExamType {
        id: "class",
        name: "Sınıf Bazlı",
        description: "1-12. Sınıf Desteği",
        students: "1M+",
        active: true,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct PracticeQuestion {
    pub id: u32,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub answer: &'static str,
}

pub const PRACTICE_QUESTIONS: [PracticeQuestion; 2] = [
    PracticeQuestion {
        id: 1,
        prompt: "1 + 1 kaç eder?",
        options: ["1", "2", "3", "4"],
        answer: "2",
    },
    PracticeQuestion {
        id: 2,
        prompt: "Dünyanın uydusunun adı nedir?",
        options: ["Mars", "Venüs", "Ay", "Jüpiter"],
        answer: "Ay",
    },
];

/// A timed exam a student can start.
#[derive(Debug, Clone, Serialize)]
pub struct Exam {
    pub id: u32,
    pub name: &'static str,
    pub questions: u32,
    /// Minutes.
    pub duration: u32,
}

pub const EXAMS: [Exam; 2] = [
    Exam {
        id: 1,
        name: "YKS Matematik",
        questions: 40,
        duration: 90,
    },
    Exam {
        id: 2,
        name: "KPSS Genel Kültür",
        questions: 60,
        duration: 120,
    },
];

pub fn find_exam(id: u32) -> Option<&'static Exam> {
    EXAMS.iter().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_practice_answers_are_options() {
        for q in &PRACTICE_QUESTIONS {
            assert!(q.options.contains(&q.answer), "question {}", q.id);
        }
    }

    #[test]
    fn test_exam_ids_unique() {
        let mut ids: Vec<_> = EXAM_SYSTEMS.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXAM_SYSTEMS.len());
    }

    #[test]
    fn test_find_exam() {
        assert_eq!(find_exam(2).map(|e| e.name), Some("KPSS Genel Kültür"));
        assert!(find_exam(0).is_none());
        assert!(find_exam(3).is_none());
    }
}
