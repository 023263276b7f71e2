//! Title classifiers
//!
//! Every classifier is an ordered list of (label, keywords) rules evaluated
//! top to bottom against the upper-cased title. The first rule with a keyword
//! that is a substring of the title wins, so the order of each table is its
//! priority.

use crate::brands::{BrandTable, OTHER_BRAND};
use crate::types::{Condition, Department, Flags, Listing, Movement, RawListing};

/// One classification rule: the label and the keywords that select it
pub type Rule<L> = (L, &'static [&'static str]);

const CONDITION_RULES: &[Rule<Condition>] = &[
    // Exclusive-parts keywords beat every positive "watch" signal
    (
        Condition::Parts,
        &[
            "BAND ONLY",
            "STRAP ONLY",
            "BRACELET ONLY",
            "BELT ONLY",
            "BEZEL ONLY",
            "DIAL ONLY",
            "CASE ONLY",
            "CASE BACK ONLY",
            "CROWN ONLY",
            "HANDS ONLY",
            "MOVEMENT ONLY",
            "CRYSTAL ONLY",
            "BUCKLE ONLY",
            "CLASP ONLY",
            "LINKS ONLY",
            "BOX ONLY",
            "EMPTY BOX",
            "MANUAL ONLY",
            "PARTS ONLY",
            "NO WATCH",
            "REPLACEMENT BAND",
            "REPLACEMENT STRAP",
        ],
    ),
    (
        Condition::Repair,
        &[
            "FOR PARTS",
            "NOT WORKING",
            "NON WORKING",
            "NON-WORKING",
            "DOES NOT WORK",
            "FOR REPAIR",
            "NEEDS REPAIR",
            "BROKEN",
            "JUNK",
            "UNTESTED",
            " AS IS",
            "AS-IS",
        ],
    ),
    (
        Condition::Complete,
        &[
            "WATCH",
            "AUTOMATIC",
            "QUARTZ",
            "SOLAR",
            "KINETIC",
            "SPRING DRIVE",
            "ECO-DRIVE",
            "CHRONOGRAPH",
            "DIVER",
            "MECHANICAL",
            "HAND WIND",
            "DIGITAL",
            "ANALOG",
            "MEN'S",
            "WOMEN'S",
            "LADIES",
            "WORKING",
            "腕時計",
        ],
    ),
];

const MOVEMENT_RULES: &[Rule<Movement>] = &[
    (Movement::SpringDrive, &["SPRING DRIVE", "SPRINGDRIVE", "9R65", "9R15"]),
    (Movement::Kinetic, &["KINETIC", "AUTO QUARTZ", "AUTO-QUARTZ"]),
    (Movement::Solar, &["SOLAR", "ECO-DRIVE", "ECO DRIVE", "ECODRIVE"]),
    (
        Movement::Automatic,
        &["AUTOMATIC", "SELF-WINDING", "SELF WINDING", "AUTO WIND", "自動巻"],
    ),
    (
        Movement::Manual,
        &[
            "HAND WIND",
            "HAND-WIND",
            "HANDWIND",
            "HAND WOUND",
            "MANUAL WIND",
            "MANUAL-WIND",
            "MECHANICAL",
            "手巻",
        ],
    ),
    (Movement::Quartz, &["QUARTZ", "クォーツ", "クオーツ"]),
];

const DEPARTMENT_RULES: &[Rule<Department>] = &[
    (Department::Unisex, &["UNISEX"]),
    // WOMEN contains MEN, so women is tested first
    (
        Department::Women,
        &["WOMEN", "WOMAN", "LADIES", "LADY", "レディース"],
    ),
    (
        Department::Kids,
        &["KIDS", "KID'S", "CHILD", "BOYS", "GIRLS", "YOUTH"],
    ),
    (
        Department::Men,
        &["MEN'S", "MENS", "MEN ", "GENTS", "GENTLEMEN", "メンズ"],
    ),
];

const JDM_KEYWORDS: &[&str] = &[
    "JDM",
    "JAPAN MODEL",
    "JAPAN DOMESTIC",
    "JAPAN LIMITED",
    "JAPAN ONLY",
    "JAPANESE MODEL",
    "国内正規",
    "国内モデル",
];

const VINTAGE_KEYWORDS: &[&str] = &[
    "VINTAGE", "ANTIQUE", "RETRO", "1950S", "1960S", "1970S", "1980S", "1990S", "昭和",
];

const BOXED_KEYWORDS: &[&str] = &[
    "W/BOX",
    "W/ BOX",
    "WITH BOX",
    "BOXED",
    "BOX & PAPER",
    "BOX AND PAPER",
    "ORIGINAL BOX",
    "FULL SET",
    "箱付",
];

const PAPERED_KEYWORDS: &[&str] = &[
    "PAPERS",
    "WARRANTY",
    "GUARANTEE",
    "CERTIFICATE",
    "FULL SET",
    "保証書",
];

const COLLAB_KEYWORDS: &[&str] = &["COLLAB", "CHARACTER", "コラボ"];

const CHARACTER_RULES: &[Rule<&str>] = &[
    ("Pokemon", &["POKEMON", "POKÉMON", "PIKACHU"]),
    ("Disney", &["DISNEY", "MICKEY", "MINNIE"]),
    ("Gundam", &["GUNDAM"]),
    ("Evangelion", &["EVANGELION", "EVA-01"]),
    ("One Piece", &["ONE PIECE"]),
    ("Dragon Ball", &["DRAGON BALL", "DRAGONBALL"]),
    ("Star Wars", &["STAR WARS"]),
    ("Marvel", &["MARVEL", "SPIDER-MAN", "AVENGERS"]),
    ("Hello Kitty", &["HELLO KITTY", "SANRIO"]),
    ("Snoopy", &["SNOOPY", "PEANUTS"]),
    ("Doraemon", &["DORAEMON"]),
    ("Ultraman", &["ULTRAMAN"]),
    ("Kamen Rider", &["KAMEN RIDER", "MASKED RIDER"]),
    ("Lupin the Third", &["LUPIN"]),
    ("Naruto", &["NARUTO"]),
    ("Godzilla", &["GODZILLA"]),
];

/// Return the label of the first rule with a keyword contained in `upper`
pub fn first_match<L: Copy>(rules: &[Rule<L>], upper: &str) -> Option<L> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(label, _)| *label)
}

fn contains_any(upper: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| upper.contains(k))
}

pub fn condition_rules() -> &'static [Rule<Condition>] {
    CONDITION_RULES
}

pub fn movement_rules() -> &'static [Rule<Movement>] {
    MOVEMENT_RULES
}

pub fn department_rules() -> &'static [Rule<Department>] {
    DEPARTMENT_RULES
}

pub fn classify_condition(title: &str) -> Condition {
    first_match(CONDITION_RULES, &title.to_uppercase()).unwrap_or(Condition::Unknown)
}

pub fn classify_movement(title: &str) -> Movement {
    first_match(MOVEMENT_RULES, &title.to_uppercase()).unwrap_or(Movement::Unknown)
}

/// Trailing space lets word keywords such as `MEN ` match at the end of a title
pub fn classify_department(title: &str) -> Department {
    let padded = format!("{} ", title.to_uppercase());
    first_match(DEPARTMENT_RULES, &padded).unwrap_or(Department::Unknown)
}

/// Character or franchise named in the title, if any
pub fn classify_character(title: &str) -> Option<&'static str> {
    first_match(CHARACTER_RULES, &title.to_uppercase())
}

pub fn classify_flags(title: &str) -> Flags {
    let upper = title.to_uppercase();
    Flags {
        jdm: contains_any(&upper, JDM_KEYWORDS),
        vintage: contains_any(&upper, VINTAGE_KEYWORDS),
        boxed: contains_any(&upper, BOXED_KEYWORDS),
        papered: contains_any(&upper, PAPERED_KEYWORDS),
        collab: contains_any(&upper, COLLAB_KEYWORDS)
            || first_match(CHARACTER_RULES, &upper).is_some(),
    }
}

/// Classify a parsed CSV row into a listing.
///
/// CSV-provided labels win when they parse; otherwise the title decides.
/// A blank brand is resolved through the brand table's aliases and falls back
/// to [`OTHER_BRAND`].
pub fn classify_listing(raw: RawListing, brands: &BrandTable) -> Listing {
    let upper = raw.title.to_uppercase();

    let condition = raw
        .condition
        .as_deref()
        .and_then(Condition::from_label)
        .unwrap_or_else(|| classify_condition(&upper));
    let movement = raw
        .movement
        .as_deref()
        .and_then(Movement::from_label)
        .unwrap_or_else(|| classify_movement(&upper));
    let department = raw
        .department
        .as_deref()
        .and_then(Department::from_label)
        .unwrap_or_else(|| classify_department(&upper));

    // A CSV brand cell may hold a sub-brand such as "Grand Seiko" or "G-Shock"
    let brand = match raw.brand.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => brands
            .get(b)
            .or_else(|| brands.detect(b))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| b.to_uppercase()),
        _ => brands
            .detect(&upper)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| OTHER_BRAND.to_string()),
    };

    let (line, model) = match brands.get(&brand) {
        Some(profile) => (profile.line_for(&upper), profile.extract_model(&upper)),
        None => (format!("other-{}", brand), None),
    };

    Listing {
        flags: classify_flags(&upper),
        character: classify_character(&upper).map(str::to_string),
        title: raw.title,
        price: raw.price,
        quantity: raw.quantity,
        sale_date: raw.sale_date,
        brand,
        condition,
        movement,
        department,
        line,
        model,
    }
}
