//! The feeling meter: a few multiple-choice questions per category, turned into a
//! percentage and a verdict.
//!
//! Scores are deliberately approximate. The answers give a base percentage, to which
//! a random bonus between 0 and 9 points is added, capped at 100.

use rand::Rng;
use serde::Serialize;
use snafu::prelude::*;

use std::fmt::Display;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterCategory {
    Love,
    Friendship,
    Laziness,
    Mood,
    Maturity,
    Depression,
    Foodie,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Question {
    pub text: &'static str,
    pub options: [&'static str; 3],
}

const fn q(text: &'static str, options: [&'static str; 3]) -> Question {
    Question { text, options }
}

static LOVE: [Question; 3] = [
    q("আপনারা একসাথে কতটা সময় কাটান?", ["খুব কম", "মাঝে মাঝে", "অনেক"]),
    q("ছোট ছোট বিষয়েও কি তার কথা মনে পড়ে?", ["না", "মাঝে মাঝে", "হ্যাঁ, সবসময়"]),
    q("তার খুশিতে কি আপনিও খুশি হন?", ["না", "কিছুটা", "অনেক বেশি"]),
];

static FRIENDSHIP: [Question; 3] = [
    q("বিপদে পড়লে কাকে আগে ফোন করেন?", ["পরিবার", "অন্য কেউ", "এই বন্ধুকে"]),
    q("আপনাদের মধ্যে গোপন কথা শেয়ার হয়?", ["না", "কিছু কিছু", "সবকিছুই"]),
    q("কতদিন কথা না বলে থাকতে পারেন?", ["অনেকদিন", "কিছুদিন", "একদমই না"]),
];

static LAZINESS: [Question; 3] = [
    q("সকালে ঘুম থেকে উঠতে কেমন লাগে?", ["খুব ভালো", "কষ্ট হয়", "উঠতেই ইচ্ছা করে না"]),
    q("আজকের কাজ কালকের জন্য কতবার ফেলেন?", ["কখনোই না", "মাঝে মাঝে", "সবসময়"]),
    q("বিছানা থেকে উঠতে কতটা সময় লাগে?", ["সাথে সাথে", "একটু পর", "ঘণ্টার পর ঘণ্টা"]),
];

static MOOD: [Question; 3] = [
    q("আজ আপনার মন কেমন?", ["খুব ফুরফুরে", "মোটামুটি", "একদম ভালো না"]),
    q("ছোট ছোট জিনিসে কি আনন্দ পাচ্ছেন?", ["হ্যাঁ, পাচ্ছি", "মাঝে মাঝে", "একদমই না"]),
    q("ভবিষ্যৎ নিয়ে কী ভাবছেন?", ["খুব আশাবাদী", "কিছুটা চিন্তিত", "খুব হতাশ লাগছে"]),
];

static MATURITY: [Question; 3] = [
    q("সমালোচনা কীভাবে গ্রহণ করেন?", ["রেগে যাই", "কিছুটা ভাবি", "শান্তভাবে শুনি"]),
    q("নিজের ভুলের জন্য কি ক্ষমা চান?", ["না", "পরিস্থিতি বুঝে", "হ্যাঁ, চাই"]),
    q("অন্যের মতামতকে গুরুত্ব দেন?", ["কম", "মাঝে মাঝে", "সবসময়"]),
];

static DEPRESSION: [Question; 3] = [
    q("সবকিছুতে কি আগ্রহ হারিয়ে ফেলছেন?", ["না", "কিছুটা", "হ্যাঁ"]),
    q("আপনার ঘুমের রুটিন কেমন?", ["স্বাভাবিক", "কিছুটা অনিয়মিত", "খুবই অনিয়মিত"]),
    q("নিজেকে কি প্রায়ই একা মনে হয়?", ["না", "মাঝে মাঝে", "হ্যাঁ, প্রায়ই"]),
];

static FOODIE: [Question; 3] = [
    q("নতুন খাবার চেষ্টা করতে কেমন লাগে?", ["ভয় লাগে", "মাঝে মাঝে", "খুব ভালোবাসি"]),
    q("আপনার দিনের সেরা অংশ কোনটি?", ["কাজ", "ঘুম", "খাবার সময়"]),
    q("সোশ্যাল মিডিয়ায় খাবারের ছবি দেখেন?", ["না", "মাঝে মাঝে", "হ্যাঁ, সবসময়"]),
];

/// The outcome text for a score band.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
pub struct Verdict {
    pub text: &'static str,
    pub emoji: &'static str,
}

const fn v(text: &'static str, emoji: &'static str) -> Verdict {
    Verdict { text, emoji }
}

// (upper threshold, middle threshold, [high, middle, low])
type Bands = (u32, u32, [Verdict; 3]);

impl MeterCategory {
    pub const ALL: [MeterCategory; 7] = [
        MeterCategory::Love,
        MeterCategory::Friendship,
        MeterCategory::Laziness,
        MeterCategory::Mood,
        MeterCategory::Maturity,
        MeterCategory::Depression,
        MeterCategory::Foodie,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MeterCategory::Love => "love",
            MeterCategory::Friendship => "friendship",
            MeterCategory::Laziness => "laziness",
            MeterCategory::Mood => "mood",
            MeterCategory::Maturity => "maturity",
            MeterCategory::Depression => "depression",
            MeterCategory::Foodie => "foodie",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MeterCategory::Love => "ভালোবাসা",
            MeterCategory::Friendship => "বন্ধুত্ব",
            MeterCategory::Laziness => "অলসতা",
            MeterCategory::Mood => "মুড",
            MeterCategory::Maturity => "ম্যাচিউরিটি",
            MeterCategory::Depression => "হতাশার লেভেল",
            MeterCategory::Foodie => "খাদ্য প্রেম",
        }
    }

    /// Accepts either the key (`love`) or the display name.
    pub fn parse(name: &str) -> Option<MeterCategory> {
        let name = name.trim();
        MeterCategory::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(name) || c.display_name() == name)
    }

    /// Love and friendship are measured between two named people.
    pub fn needs_names(&self) -> bool {
        matches!(self, MeterCategory::Love | MeterCategory::Friendship)
    }

    pub fn questions(&self) -> &'static [Question] {
        match self {
            MeterCategory::Love => &LOVE,
            MeterCategory::Friendship => &FRIENDSHIP,
            MeterCategory::Laziness => &LAZINESS,
            MeterCategory::Mood => &MOOD,
            MeterCategory::Maturity => &MATURITY,
            MeterCategory::Depression => &DEPRESSION,
            MeterCategory::Foodie => &FOODIE,
        }
    }

    fn bands(&self) -> Bands {
        match self {
            MeterCategory::Love => (
                80,
                50,
                [
                    v("এটা একেবারে প্রেমিক-লেভেল ভালোবাসা!", "🥰"),
                    v("আপনাদের সম্পর্ক বেশ মজবুত!", "😊"),
                    v("আরো একটু যত্ন নিন!", "🤔"),
                ],
            ),
            MeterCategory::Friendship => (
                80,
                50,
                [
                    v("আপনারা মানিকজোড় বন্ধু!", "😎"),
                    v("বন্ধুত্ব বেশ ভালো!", "🙂"),
                    v("বন্ধুত্বে আরও সময় দিন!", "😐"),
                ],
            ),
            MeterCategory::Laziness => (
                80,
                50,
                [
                    v("আপনি তো কুম্ভকর্ণের বংশধর!", "😴"),
                    v("মাঝে মাঝে আলসেমি ভালো!", "😌"),
                    v("আপনি খুবই কর্মঠ!", "💪"),
                ],
            ),
            MeterCategory::Mood => (
                70,
                40,
                [
                    v("আপনার মন আজ ফুরফুরে!", "😄"),
                    v("মনটা একটু মেঘলা।", "😕"),
                    v("মন খারাপ করবেন না, সব ঠিক হয়ে যাবে!", "😔"),
                ],
            ),
            MeterCategory::Maturity => (
                80,
                50,
                [
                    v("আপনি খুবই পরিণত!", "🧐"),
                    v("আপনি সঠিক পথেই আছেন!", "👍"),
                    v("অভিজ্ঞতা আপনাকে শিখিয়ে দেবে!", "🌱"),
                ],
            ),
            MeterCategory::Depression => (
                75,
                40,
                [
                    v("বিশেষজ্ঞের পরামর্শ নেওয়া প্রয়োজন।", "🫂"),
                    v("নিজের যত্ন নিন, বন্ধুদের সাথে কথা বলুন।", "❤️"),
                    v("আপনি মানসিকভাবে শক্তিশালী আছেন!", "😊"),
                ],
            ),
            MeterCategory::Foodie => (
                80,
                50,
                [
                    v("আপনি একজন সত্যিকারের খাদ্যরসিক!", "😋"),
                    v("খাবার উপভোগ করতে জানেন!", "🍔"),
                    v("আপনি স্বাস্থ্যসচেতন!", "🍎"),
                ],
            ),
        }
    }
}

impl Display for MeterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Snafu)]
pub enum ScoringError {
    #[snafu(display("{category} has {expected} questions but {got} answers were given"))]
    IncompleteAnswers {
        category: MeterCategory,
        expected: usize,
        got: usize,
    },

    #[snafu(display("question {question} has no option {answer} (it has {options})"))]
    InvalidAnswer {
        question: usize,
        answer: usize,
        options: usize,
    },

    #[snafu(display("{category} needs two names"))]
    MissingNames { category: MeterCategory },
}

/// The result shown on the meter page.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct MeterReading {
    pub category: MeterCategory,
    pub names: Option<(String, String)>,
    pub score: u32,
    pub verdict: Verdict,
}

/// Computes the percentage for one set of answers (one option index per question).
///
/// Each question is worth 0 to 2 points, so the base score is `points / (2 * questions)`,
/// in whole percents rounded down. The random bonus is drawn from `rng`.
pub fn score<R: Rng + ?Sized>(
    category: MeterCategory,
    answers: &[usize],
    rng: &mut R,
) -> Result<u32, ScoringError> {
    let questions = category.questions();
    ensure!(
        answers.len() == questions.len(),
        IncompleteAnswersSnafu {
            category,
            expected: questions.len(),
            got: answers.len()
        }
    );
    let mut points: u32 = 0;
    let mut max_points: u32 = 0;
    for (idx, (answer, question)) in answers.iter().zip(questions.iter()).enumerate() {
        let num_options = question.options.len();
        ensure!(
            *answer < num_options,
            InvalidAnswerSnafu {
                question: idx + 1,
                answer: *answer,
                options: num_options
            }
        );
        points += *answer as u32;
        max_points += (num_options - 1) as u32;
    }
    let base = if max_points == 0 {
        0
    } else {
        points * 100 / max_points
    };
    let bonus: u32 = rng.gen_range(0..10);
    Ok((base + bonus).min(100))
}

pub fn verdict(category: MeterCategory, score: u32) -> Verdict {
    let (high, middle, [high_v, middle_v, low_v]) = category.bands();
    if score > high {
        high_v
    } else if score > middle {
        middle_v
    } else {
        low_v
    }
}

/// Runs the whole meter: checks the names when the category needs them, scores the
/// answers and picks the verdict.
pub fn read_meter<R: Rng + ?Sized>(
    category: MeterCategory,
    names: Option<(&str, &str)>,
    answers: &[usize],
    rng: &mut R,
) -> Result<MeterReading, ScoringError> {
    let names = names
        .map(|(a, b)| (a.trim().to_string(), b.trim().to_string()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty());
    ensure!(
        !category.needs_names() || names.is_some(),
        MissingNamesSnafu { category }
    );
    let s = score(category, answers, rng)?;
    Ok(MeterReading {
        category,
        names: if category.needs_names() { names } else { None },
        score: s,
        verdict: verdict(category, s),
    })
}
