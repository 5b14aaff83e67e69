//! Declarative tag-sequence grammars, one per message type.
//!
//! A grammar is an ordered list of elements, each either a set of alternative
//! tags or a nested group, with a cardinality. [`crate::page::PageReader`]
//! interprets any of them with the same algorithm.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Mandatory,
    Optional,
    /// One or more.
    Repeatable,
    ZeroOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Alternative tags, e.g. `60F` or `60M`.
    Tag(&'static [&'static str]),
    Group(&'static [GrammarElement]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarElement {
    pub kind: ElementKind,
    pub cardinality: Cardinality,
}

impl GrammarElement {
    pub const fn mandatory(tags: &'static [&'static str]) -> Self {
        Self::tags(tags, Cardinality::Mandatory)
    }

    pub const fn optional(tags: &'static [&'static str]) -> Self {
        Self::tags(tags, Cardinality::Optional)
    }

    pub const fn repeatable(tags: &'static [&'static str]) -> Self {
        Self::tags(tags, Cardinality::Repeatable)
    }

    pub const fn zero_or_more(tags: &'static [&'static str]) -> Self {
        Self::tags(tags, Cardinality::ZeroOrMore)
    }

    pub const fn tags(tags: &'static [&'static str], cardinality: Cardinality) -> Self {
        GrammarElement {
            kind: ElementKind::Tag(tags),
            cardinality,
        }
    }

    pub const fn group(elements: &'static [GrammarElement], cardinality: Cardinality) -> Self {
        GrammarElement {
            kind: ElementKind::Group(elements),
            cardinality,
        }
    }

    /// Whether this element may be skipped entirely.
    pub fn is_nullable(&self) -> bool {
        match self.cardinality {
            Cardinality::Optional | Cardinality::ZeroOrMore => true,
            Cardinality::Mandatory | Cardinality::Repeatable => match self.kind {
                ElementKind::Tag(_) => false,
                ElementKind::Group(elements) => elements.iter().all(GrammarElement::is_nullable),
            },
        }
    }

    /// Tags that can open this element.
    pub fn first_tags(&self) -> BTreeSet<&'static str> {
        match self.kind {
            ElementKind::Tag(tags) => tags.iter().copied().collect(),
            ElementKind::Group(elements) => first_tags(elements),
        }
    }

    pub fn starts_with(&self, tag: &str) -> bool {
        match self.kind {
            ElementKind::Tag(tags) => tags.contains(&tag),
            ElementKind::Group(_) => self.first_tags().contains(tag),
        }
    }
}

/// Tags that can open a sequence: every nullable prefix element plus the
/// first mandatory one.
pub fn first_tags(elements: &[GrammarElement]) -> BTreeSet<&'static str> {
    let mut tags = BTreeSet::new();
    for element in elements {
        tags.extend(element.first_tags());
        if !element.is_nullable() {
            break;
        }
    }
    tags
}

/// Tag sequence of one message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGrammar {
    pub name: &'static str,
    pub elements: &'static [GrammarElement],
}

impl PageGrammar {
    /// Tags that can open a page of this type.
    pub fn opening_tags(&self) -> BTreeSet<&'static str> {
        first_tags(self.elements)
    }
}

const STATEMENT_LINE: &[GrammarElement] = &[
    GrammarElement::mandatory(&["61"]),
    GrammarElement::optional(&["86"]),
];

/// MT940 customer statement.
pub static MT940: PageGrammar = PageGrammar {
    name: "MT940",
    elements: &[
        GrammarElement::mandatory(&["20"]),
        GrammarElement::optional(&["21"]),
        GrammarElement::mandatory(&["25", "25P"]),
        GrammarElement::mandatory(&["28C", "28"]),
        GrammarElement::mandatory(&["60F", "60M"]),
        GrammarElement::group(STATEMENT_LINE, Cardinality::ZeroOrMore),
        GrammarElement::mandatory(&["62F", "62M"]),
        GrammarElement::optional(&["64"]),
        GrammarElement::zero_or_more(&["65"]),
        GrammarElement::optional(&["86"]),
    ],
};

/// MT942 interim transaction report.
pub static MT942: PageGrammar = PageGrammar {
    name: "MT942",
    elements: &[
        GrammarElement::mandatory(&["20"]),
        GrammarElement::optional(&["21"]),
        GrammarElement::mandatory(&["25", "25P"]),
        GrammarElement::mandatory(&["28C"]),
        GrammarElement::mandatory(&["34F"]),
        GrammarElement::optional(&["34F"]),
        GrammarElement::mandatory(&["13D"]),
        GrammarElement::group(STATEMENT_LINE, Cardinality::ZeroOrMore),
        GrammarElement::optional(&["90D"]),
        GrammarElement::optional(&["90C"]),
        GrammarElement::optional(&["86"]),
    ],
};

/// MT103 single customer credit transfer.
pub static MT103: PageGrammar = PageGrammar {
    name: "MT103",
    elements: &[
        GrammarElement::mandatory(&["20"]),
        GrammarElement::zero_or_more(&["13C"]),
        GrammarElement::mandatory(&["23B"]),
        GrammarElement::zero_or_more(&["23E"]),
        GrammarElement::optional(&["26T"]),
        GrammarElement::mandatory(&["32A"]),
        GrammarElement::optional(&["33B"]),
        GrammarElement::optional(&["36"]),
        GrammarElement::mandatory(&["50A", "50F", "50K"]),
        GrammarElement::optional(&["51A"]),
        GrammarElement::optional(&["52A", "52D"]),
        GrammarElement::optional(&["53A", "53B", "53D"]),
        GrammarElement::optional(&["54A", "54B", "54D"]),
        GrammarElement::optional(&["55A", "55B", "55D"]),
        GrammarElement::optional(&["56A", "56C", "56D"]),
        GrammarElement::optional(&["57A", "57B", "57C", "57D"]),
        GrammarElement::mandatory(&["59", "59A", "59F"]),
        GrammarElement::optional(&["70"]),
        GrammarElement::mandatory(&["71A"]),
        GrammarElement::zero_or_more(&["71F"]),
        GrammarElement::optional(&["71G"]),
        GrammarElement::optional(&["72"]),
        GrammarElement::optional(&["77B"]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_opening_tags() {
        assert_eq!(MT940.opening_tags().into_iter().collect::<Vec<_>>(), vec!["20"]);
        assert_eq!(MT103.opening_tags().into_iter().collect::<Vec<_>>(), vec!["20"]);
    }

    #[test]
    fn test_group_first_tags() {
        let group = GrammarElement::group(STATEMENT_LINE, Cardinality::ZeroOrMore);
        assert!(group.is_nullable());
        assert!(group.starts_with("61"));
        assert!(!group.starts_with("86"));
    }

    #[test]
    fn test_nullable_prefix_extends_first_set() {
        const ELEMENTS: &[GrammarElement] = &[
            GrammarElement::optional(&["21"]),
            GrammarElement::zero_or_more(&["13C"]),
            GrammarElement::mandatory(&["25"]),
            GrammarElement::mandatory(&["28C"]),
        ];
        assert_eq!(
            first_tags(ELEMENTS).into_iter().collect::<Vec<_>>(),
            vec!["13C", "21", "25"]
        );
    }

    #[test]
    fn test_every_grammar_has_a_mandatory_opening() {
        for grammar in [&MT940, &MT942, &MT103] {
            assert!(!grammar.elements[0].is_nullable(), "{}", grammar.name);
        }
    }
}
