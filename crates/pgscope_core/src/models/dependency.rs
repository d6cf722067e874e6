//! Dependency models: object kinds, dependency classes and result rows.

use serde::{Deserialize, Serialize};

/// Kind of catalog object on the other end of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    Index,
    Sequence,
    View,
    MaterializedView,
    ForeignTable,
    Function,
    Schema,
    Type,
    Trigger,
    Language,
    Rule,
    CheckConstraint,
    ForeignKey,
    PrimaryKey,
    Unique,
    Unknown,
}

/// Outcome of reading a discriminator code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    /// A kind the browser can show.
    Kind(ObjectKind),
    /// Composite type, special or toast relations; never shown.
    Skip,
}

impl ObjectKind {
    /// Classify a catalog discriminator.
    ///
    /// The first character is the relation kind or the synthetic code for
    /// the owning catalog; constraints carry their `contype` as a second
    /// character. Unrecognized codes, including an empty one, are
    /// [`ObjectKind::Unknown`].
    pub fn classify(code: &str) -> Discriminator {
        let mut chars = code.chars();
        let kind = match chars.next() {
            Some('c' | 's' | 't') => return Discriminator::Skip,
            Some('r') => Self::Table,
            Some('i') => Self::Index,
            Some('S') => Self::Sequence,
            Some('v') => Self::View,
            Some('m') => Self::MaterializedView,
            Some('f') => Self::ForeignTable,
            Some('p') => Self::Function,
            Some('n') => Self::Schema,
            Some('y') => Self::Type,
            Some('T') => Self::Trigger,
            Some('l') => Self::Language,
            Some('R') => Self::Rule,
            Some('C') => match chars.next() {
                Some('c') => Self::CheckConstraint,
                Some('f') => Self::ForeignKey,
                Some('p') => Self::PrimaryKey,
                Some('u') => Self::Unique,
                _ => Self::Unknown,
            },
            _ => Self::Unknown,
        };
        Discriminator::Kind(kind)
    }

    /// Human label for the kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Index => "Index",
            Self::Sequence => "Sequence",
            Self::View => "View",
            Self::MaterializedView => "Materialized View",
            Self::ForeignTable => "Foreign Table",
            Self::Function => "Function",
            Self::Schema => "Schema",
            Self::Type => "Type",
            Self::Trigger => "Trigger",
            Self::Language => "Language",
            Self::Rule => "Rule",
            Self::CheckConstraint => "Check",
            Self::ForeignKey => "Foreign Key",
            Self::PrimaryKey => "Primary Key",
            Self::Unique => "Unique",
            Self::Unknown => "Unknown",
        }
    }

    /// Stable key a presentation layer maps to an icon.
    pub fn icon_key(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Index => "index",
            Self::Sequence => "sequence",
            Self::View => "view",
            Self::MaterializedView => "mview",
            Self::ForeignTable => "foreigntable",
            Self::Function => "function",
            Self::Schema => "schema",
            Self::Type => "type",
            Self::Trigger => "trigger",
            Self::Language => "language",
            Self::Rule => "rule",
            Self::CheckConstraint => "check",
            Self::ForeignKey => "foreignkey",
            Self::PrimaryKey => "primarykey",
            Self::Unique => "unique",
            Self::Unknown => "unknown",
        }
    }
}

/// `pg_depend.deptype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyClass {
    Normal,
    Auto,
    Internal,
    Pin,
    Extension,
    /// A code this client does not know; shown with an empty restriction.
    Unknown,
}

impl DependencyClass {
    /// Parse the single-character `deptype` code.
    pub fn from_code(code: &str) -> Self {
        match code.chars().next() {
            Some('n') => Self::Normal,
            Some('a') => Self::Auto,
            Some('i') => Self::Internal,
            Some('p') => Self::Pin,
            Some('e') => Self::Extension,
            _ => Self::Unknown,
        }
    }

    /// Restriction text shown next to the object.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Auto => "auto",
            Self::Internal => "internal",
            Self::Pin => "pin",
            Self::Extension => "extension",
            Self::Unknown => "",
        }
    }
}

/// One annotated dependency, ready for a two-column (kind, name) view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRow {
    /// Classified kind of the object.
    pub kind: ObjectKind,
    /// Kind label; empty for pinned dependencies.
    pub type_label: String,
    /// Object name as stored in the catalog.
    pub name: String,
    /// Name as shown: schema-qualified, rules as `rule ON table`,
    /// foreign keys as `table.constraint`.
    pub display_name: String,
    /// Owning table of a rule or constraint.
    pub owner_table: Option<String>,
    /// Namespace of the object.
    pub namespace: Option<String>,
    /// Dependency class of the edge.
    pub dependency_class: DependencyClass,
}

impl DependencyRow {
    /// Icon key for the row's kind.
    pub fn icon_key(&self) -> &'static str {
        self.kind.icon_key()
    }

    /// Restriction column text.
    pub fn restriction(&self) -> &'static str {
        self.dependency_class.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_character_codes() {
        assert_eq!(ObjectKind::classify("r"), Discriminator::Kind(ObjectKind::Table));
        assert_eq!(ObjectKind::classify("S"), Discriminator::Kind(ObjectKind::Sequence));
        assert_eq!(ObjectKind::classify("T"), Discriminator::Kind(ObjectKind::Trigger));
        assert_eq!(ObjectKind::classify("R"), Discriminator::Kind(ObjectKind::Rule));
        assert_eq!(ObjectKind::classify("m"), Discriminator::Kind(ObjectKind::MaterializedView));
        assert_eq!(ObjectKind::classify("f"), Discriminator::Kind(ObjectKind::ForeignTable));
    }

    #[test]
    fn test_classify_constraint_subtypes() {
        assert_eq!(ObjectKind::classify("Cf"), Discriminator::Kind(ObjectKind::ForeignKey));
        assert_eq!(ObjectKind::classify("Cp"), Discriminator::Kind(ObjectKind::PrimaryKey));
        assert_eq!(ObjectKind::classify("Cx"), Discriminator::Kind(ObjectKind::Unknown));
        assert_eq!(ObjectKind::classify("C"), Discriminator::Kind(ObjectKind::Unknown));
    }

    #[test]
    fn test_classify_skipped_and_unknown() {
        for code in ["c", "s", "t"] {
            assert_eq!(ObjectKind::classify(code), Discriminator::Skip);
        }
        assert_eq!(ObjectKind::classify(""), Discriminator::Kind(ObjectKind::Unknown));
        assert_eq!(ObjectKind::classify("z"), Discriminator::Kind(ObjectKind::Unknown));
    }

    #[test]
    fn test_dependency_class_codes() {
        assert_eq!(DependencyClass::from_code("n"), DependencyClass::Normal);
        assert_eq!(DependencyClass::from_code("p").as_str(), "pin");
        assert_eq!(DependencyClass::from_code("").as_str(), "");
        assert_eq!(DependencyClass::from_code("x"), DependencyClass::Unknown);
    }
}
