//! The canned step-by-step solution returned by the photo solver.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SolutionStep {
    pub step: u32,
    pub action: &'static str,
    pub result: &'static str,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub problem_text: String,
    pub problem_type: &'static str,
    pub difficulty: &'static str,
    pub steps: Vec<SolutionStep>,
    pub explanation: &'static str,
    pub video_suggestion: &'static str,
    pub similar_problems: [&'static str; 3],
}

const CANNED_PROBLEM: &str = "2x + 5 = 13";

/// Builds the solution for `ocr_text`. Without recognised text the canned
/// problem is reported.
pub fn solve(ocr_text: &str) -> Solution {
    let ocr_text = ocr_text.trim();
    let problem_text = if ocr_text.is_empty() {
        CANNED_PROBLEM.to_string()
    } else {
        ocr_text.to_string()
    };

    Solution {
        problem_text,
        problem_type: "Denklem",
        difficulty: "Temel",
        steps: vec![
            SolutionStep {
                step: 1,
                action: "5'i sağ tarafa at (işaret değiştirir)",
                result: "2x = 13 - 5",
                explanation: "Eşitliğin bir tarafındaki terimi diğer tarafa geçirirken işareti değişir",
            },
            SolutionStep {
                step: 2,
                action: "İşlemi yap",
                result: "2x = 8",
                explanation: "13 - 5 = 8",
            },
            SolutionStep {
                step: 3,
                action: "Her iki tarafı 2'ye böl",
                result: "x = 4",
                explanation: "8 / 2 = 4",
            },
        ],
        explanation: "Bu bir birinci dereceden denklemdir. Bilinmeyeni (x) yalnız bırakmak için adım adım işlem yapıyoruz.",
        video_suggestion: "Bu konuyla ilgili senin için özel video hazırlayabilirim!",
        similar_problems: ["3x + 7 = 16", "5x - 3 = 12", "4x + 2 = 18"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_problem_when_nothing_recognised() {
        let solution = solve("  \n");
        assert_eq!(solution.problem_text, CANNED_PROBLEM);
        assert_eq!(solution.steps.len(), 3);
        assert_eq!(solution.steps.last().unwrap().result, "x = 4");
    }

    #[test]
    fn test_ocr_text_replaces_problem() {
        assert_eq!(solve(" 3x + 7 = 16 ").problem_text, "3x + 7 = 16");
    }
}
