// src/grader.rs

use std::collections::HashMap;

/// Number of questions on the quiz form.
pub const QUESTION_COUNT: usize = 7;

/// Accepted answers per question slot. Matching is case-insensitive and
/// whitespace-trimmed, so these are stored lowercase.
const ANSWER_BANK: [(&str, &[&str]); QUESTION_COUNT] = [
    ("question1", &["paper jam", "paperjam", "jam", "paper stuck"]),
    ("question2", &["print head", "printhead", "head", "printer head"]),
    (
        "question3",
        &[
            "printer setup",
            "setup",
            "installation",
            "printer installation",
            "configure",
            "configuration",
        ],
    ),
    (
        "question4",
        &[
            "instant ink",
            "instantink",
            "instant",
            "ink subscription",
            "subscription service",
        ],
    ),
    (
        "question5",
        &[
            "data product",
            "dataproduct",
            "data analytics",
            "analytics product",
            "data solution",
        ],
    ),
    (
        "question6",
        &[
            "root cause analysis",
            "rootcauseanalysis",
            "rca",
            "root cause",
            "cause analysis",
        ],
    ),
    (
        "question7",
        &[
            "telemetry",
            "remote monitoring",
            "data transmission",
            "remote data",
            "monitoring",
        ],
    ),
];

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeResult {
    pub score: i32,
    pub perfect: bool,
    /// question id -> whether the given answer matched.
    pub details: HashMap<String, bool>,
}

/// Scores free-text answers against the accepted-answer bank.
///
/// An answer matches when its lowercased, trimmed text equals one of the
/// accepted variants. Missing slots grade as incorrect. Keys outside the
/// seven known question ids are ignored.
pub fn grade(answers: &HashMap<String, String>) -> GradeResult {
    let mut score = 0;
    let mut details = HashMap::with_capacity(QUESTION_COUNT);

    for (question, accepted) in ANSWER_BANK {
        let correct = answers
            .get(question)
            .map(|given| {
                let given = given.trim().to_lowercase();
                accepted.iter().any(|a| given == *a)
            })
            .unwrap_or(false);

        if correct {
            score += 1;
        }
        details.insert(question.to_string(), correct);
    }

    GradeResult {
        score,
        perfect: score as usize == QUESTION_COUNT,
        details,
    }
}
