//! Name matchers for transition sources and callback filters.
//!
//! A matcher selects a set of names: everything, an explicit list, or
//! everything except a list. `None` stands for the nil state.

/// Selects states (or events) by name.
///
/// # Example
///
/// ```rust
/// use statebound::core::Matcher;
///
/// let any_but_parked = Matcher::all_except(["parked"]);
/// assert!(any_but_parked.matches(Some("idling")));
/// assert!(!any_but_parked.matches(Some("parked")));
///
/// let only: Matcher = ["parked", "idling"].into();
/// assert!(only.matches(Some("parked")));
/// assert!(!only.matches(None));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Matcher {
    /// Every name, including nil.
    #[default]
    All,
    /// Only the listed names.
    Only(Vec<Option<String>>),
    /// Every name except the listed ones.
    AllExcept(Vec<Option<String>>),
}

impl Matcher {
    pub fn all() -> Self {
        Self::All
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(|n| Some(n.into())).collect())
    }

    pub fn all_except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllExcept(names.into_iter().map(|n| Some(n.into())).collect())
    }

    /// Matches only the nil state.
    pub fn nil() -> Self {
        Self::Only(vec![None])
    }

    pub fn matches(&self, name: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n.as_deref() == name),
            Self::AllExcept(names) => !names.iter().any(|n| n.as_deref() == name),
        }
    }

    /// Names mentioned explicitly, in either an inclusion or an exclusion.
    pub fn referenced(&self) -> impl Iterator<Item = Option<&str>> {
        let names: &[Option<String>] = match self {
            Self::All => &[],
            Self::Only(names) | Self::AllExcept(names) => names,
        };
        names.iter().map(Option::as_deref)
    }
}

impl From<&str> for Matcher {
    fn from(name: &str) -> Self {
        Self::only([name])
    }
}

impl From<String> for Matcher {
    fn from(name: String) -> Self {
        Self::only([name])
    }
}

impl<const N: usize> From<[&str; N]> for Matcher {
    fn from(names: [&str; N]) -> Self {
        Self::only(names)
    }
}

impl From<Vec<&str>> for Matcher {
    fn from(names: Vec<&str>) -> Self {
        Self::only(names)
    }
}

impl From<Vec<String>> for Matcher {
    fn from(names: Vec<String>) -> Self {
        Self::only(names)
    }
}
