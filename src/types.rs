//! Listing types and the closed label sets the classifiers produce

use chrono::NaiveDate;

/// Physical completeness of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Complete,
    Parts,
    Repair,
    Unknown,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Complete,
        Condition::Parts,
        Condition::Repair,
        Condition::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Complete => "complete",
            Condition::Parts => "parts",
            Condition::Repair => "repair",
            Condition::Unknown => "unknown",
        }
    }

    /// Parse a label from a CSV cell. Blank and unrecognized labels return
    /// None so the title classifier can decide instead.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "complete" | "working" | "used" | "pre-owned" | "new" => Some(Condition::Complete),
            "parts" | "parts only" => Some(Condition::Parts),
            "repair" | "for parts or not working" | "junk" => Some(Condition::Repair),
            _ => None,
        }
    }
}

/// Movement (caliber family)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    SpringDrive,
    Kinetic,
    Solar,
    Automatic,
    Manual,
    Quartz,
    Unknown,
}

impl Movement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::SpringDrive => "Spring Drive",
            Movement::Kinetic => "Kinetic",
            Movement::Solar => "Solar",
            Movement::Automatic => "Automatic",
            Movement::Manual => "Manual wind",
            Movement::Quartz => "Quartz",
            Movement::Unknown => "Unknown",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spring drive" => Some(Movement::SpringDrive),
            "kinetic" | "auto quartz" => Some(Movement::Kinetic),
            "solar" | "eco-drive" | "eco drive" => Some(Movement::Solar),
            "automatic" | "self-winding" | "self winding" => Some(Movement::Automatic),
            "manual" | "manual wind" | "hand wind" | "hand-wind" | "mechanical" => {
                Some(Movement::Manual)
            }
            "quartz" | "battery" => Some(Movement::Quartz),
            _ => None,
        }
    }
}

/// Target department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Department {
    Men,
    Women,
    Unisex,
    Kids,
    Unknown,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Men => "Men",
            Department::Women => "Women",
            Department::Unisex => "Unisex",
            Department::Kids => "Kids",
            Department::Unknown => "Unknown",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "men" | "mens" | "men's" | "male" => Some(Department::Men),
            "women" | "womens" | "women's" | "ladies" | "female" => Some(Department::Women),
            "unisex" | "unisex adult" => Some(Department::Unisex),
            "kids" | "boys" | "girls" | "children" => Some(Department::Kids),
            _ => None,
        }
    }
}

/// Boolean markers derived from the title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub jdm: bool,
    pub vintage: bool,
    pub boxed: bool,
    pub papered: bool,
    pub collab: bool,
}

/// One CSV row after parsing, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub title: String,
    pub price: f64,
    pub quantity: u32,
    pub sale_date: Option<NaiveDate>,
    pub brand: Option<String>,
    pub condition: Option<String>,
    pub department: Option<String>,
    pub movement: Option<String>,
}

/// A fully classified listing
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub title: String,
    pub price: f64,
    pub quantity: u32,
    pub sale_date: Option<NaiveDate>,
    pub brand: String,
    pub condition: Condition,
    pub movement: Movement,
    pub department: Department,
    pub line: String,
    pub model: Option<String>,
    pub flags: Flags,
    pub character: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_case_insensitively() {
        assert_eq!(Condition::from_label(" Parts "), Some(Condition::Parts));
        assert_eq!(Movement::from_label("ECO-DRIVE"), Some(Movement::Solar));
        assert_eq!(Department::from_label("Men's"), Some(Department::Men));
    }

    #[test]
    fn test_unknown_labels_defer_to_classifier() {
        assert_eq!(Condition::from_label(""), None);
        assert_eq!(Condition::from_label("unknown"), None);
        assert_eq!(Movement::from_label("tourbillon"), None);
        assert_eq!(Department::from_label("n/a"), None);
    }
}
