//! Bit-valued categories stored in bitmask columns
//!
//! Every category value owns a distinct power-of-two bit, so a set of values is a
//! single integer and the SQL side can test membership with a bitwise AND.

use std::fmt;
use std::hash::Hash;

/// A closed enumeration whose values are single bits of an integer column
pub trait Category: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Human-readable kind, used in conversion errors
    const KIND: &'static str;

    fn all() -> &'static [Self];

    fn name(self) -> &'static str;

    fn bits(self) -> u64;

    /// Canonical name lookup; categories with aliases override this
    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.name() == name)
    }

    /// OR of the bits of every value
    fn mask_of(values: &[Self]) -> u64 {
        values.iter().fold(0, |acc, v| acc | v.bits())
    }

    /// Values whose bits are set in `mask`
    fn from_mask(mask: u64) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|c| mask & c.bits() != 0)
            .collect()
    }
}

macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident = $bits:expr => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant,)+];

            fn canonical(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(Category::name(*self))
            }
        }

        impl $name {
            fn text(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            fn value(self) -> u64 {
                match self {
                    $($name::$variant => $bits,)+
                }
            }
        }
    };
}

category! {
    /// Role of a family member relative to the proband
    Role, "role" {
        MaternalGrandmother = 1 => "maternal_grandmother",
        MaternalGrandfather = 1 << 1 => "maternal_grandfather",
        PaternalGrandmother = 1 << 2 => "paternal_grandmother",
        PaternalGrandfather = 1 << 3 => "paternal_grandfather",
        Mom = 1 << 4 => "mom",
        Dad = 1 << 5 => "dad",
        Parent = 1 << 6 => "parent",
        Prb = 1 << 7 => "prb",
        Sib = 1 << 8 => "sib",
        Child = 1 << 9 => "child",
        MaternalHalfSibling = 1 << 10 => "maternal_half_sibling",
        PaternalHalfSibling = 1 << 11 => "paternal_half_sibling",
        HalfSibling = 1 << 12 => "half_sibling",
        MaternalAunt = 1 << 16 => "maternal_aunt",
        MaternalUncle = 1 << 17 => "maternal_uncle",
        PaternalAunt = 1 << 18 => "paternal_aunt",
        PaternalUncle = 1 << 19 => "paternal_uncle",
        MaternalCousin = 1 << 20 => "maternal_cousin",
        PaternalCousin = 1 << 21 => "paternal_cousin",
        StepMom = 1 << 22 => "step_mom",
        StepDad = 1 << 23 => "step_dad",
        Spouse = 1 << 24 => "spouse",
        Unknown = 1 << 25 => "unknown",
    }
}

impl Category for Role {
    const KIND: &'static str = "role";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.text()
    }

    fn bits(self) -> u64 {
        self.value()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::canonical(name).or(match name {
            "proband" => Some(Role::Prb),
            "sibling" => Some(Role::Sib),
            "mother" => Some(Role::Mom),
            "father" => Some(Role::Dad),
            _ => None,
        })
    }
}

category! {
    /// Sex of a family member
    Sex, "sex" {
        Male = 1 => "male",
        Female = 1 << 1 => "female",
        Unspecified = 1 << 2 => "unspecified",
    }
}

impl Category for Sex {
    const KIND: &'static str = "sex";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.text()
    }

    fn bits(self) -> u64 {
        self.value()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::canonical(name).or(match name {
            "M" | "m" | "1" => Some(Sex::Male),
            "F" | "f" | "2" => Some(Sex::Female),
            "U" | "u" | "0" => Some(Sex::Unspecified),
            _ => None,
        })
    }
}

category! {
    /// Mode of inheritance of an allele in a family member
    Inheritance, "inheritance" {
        Reference = 1 => "reference",
        Mendelian = 1 << 1 => "mendelian",
        Denovo = 1 << 2 => "denovo",
        PossibleDenovo = 1 << 3 => "possible_denovo",
        Omission = 1 << 4 => "omission",
        PossibleOmission = 1 << 5 => "possible_omission",
        Other = 1 << 6 => "other",
        Missing = 1 << 7 => "missing",
        Unknown = 1 << 8 => "unknown",
    }
}

impl Category for Inheritance {
    const KIND: &'static str = "inheritance";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.text()
    }

    fn bits(self) -> u64 {
        self.value()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::canonical(name)
    }
}

category! {
    /// Allele type
    VariantType, "variant type" {
        Substitution = 1 => "substitution",
        SmallInsertion = 1 << 1 => "small_insertion",
        SmallDeletion = 1 << 2 => "small_deletion",
        Complex = 1 << 3 => "complex",
        LargeDuplication = 1 << 4 => "large_duplication",
        LargeDeletion = 1 << 5 => "large_deletion",
        TandemRepeat = 1 << 6 => "tandem_repeat",
    }
}

impl Category for VariantType {
    const KIND: &'static str = "variant type";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.text()
    }

    fn bits(self) -> u64 {
        self.value()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::canonical(name).or(match name.to_ascii_lowercase().as_str() {
            "sub" => Some(VariantType::Substitution),
            "ins" | "insertion" => Some(VariantType::SmallInsertion),
            "del" | "deletion" => Some(VariantType::SmallDeletion),
            "comp" => Some(VariantType::Complex),
            "cnv+" => Some(VariantType::LargeDuplication),
            "cnv-" => Some(VariantType::LargeDeletion),
            "tr" => Some(VariantType::TandemRepeat),
            _ => None,
        })
    }
}

category! {
    /// Affected status of a family member
    Status, "affected status" {
        Unaffected = 1 => "unaffected",
        Affected = 1 << 1 => "affected",
        Unspecified = 1 << 2 => "unspecified",
    }
}

impl Category for Status {
    const KIND: &'static str = "affected status";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.text()
    }

    fn bits(self) -> u64 {
        self.value()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::canonical(name)
    }
}
