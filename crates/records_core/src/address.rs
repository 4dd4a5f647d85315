//! Record addressing: tagged addresses and the immutable address matcher.
//!
//! # Responsibility
//! - Resolve string addresses (`content://<authority>/records[/<id>]`) into
//!   the tagged `Address` exactly once per store call.
//! - Own the (pattern, kind) table the store dispatches on.
//!
//! # Invariants
//! - A matcher is immutable once built; there is no process-wide matcher.
//! - Any string that does not match a registered pattern is rejected.

use crate::contract::{
    item_type, list_type, RecordId, COLLECTION_TEMPLATE, CONTENT_SCHEME, ITEM_TEMPLATE,
    PATH_RECORDS,
};
use crate::store::{StoreError, StoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Resolved address: the whole collection or one record by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Collection,
    Item(RecordId),
}

impl Address {
    pub fn kind(&self) -> AddressKind {
        match self {
            Self::Collection => AddressKind::Collection,
            Self::Item(_) => AddressKind::Item,
        }
    }

    /// Record id for item addresses.
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Collection => None,
            Self::Item(id) => Some(*id),
        }
    }

    /// Path part of the address, without authority.
    pub fn path(&self) -> String {
        match self {
            Self::Collection => PATH_RECORDS.to_string(),
            Self::Item(id) => format!("{PATH_RECORDS}/{id}"),
        }
    }

    /// Full string form under `authority`.
    pub fn to_uri(&self, authority: &str) -> String {
        format!("{CONTENT_SCHEME}{authority}/{}", self.path())
    }

    /// Whether an observer registered on `self` must hear about a change
    /// published on `changed`.
    ///
    /// Collection observers hear every change. Item observers hear their own
    /// item and collection-wide changes, never a sibling item.
    pub fn is_notified_by(&self, changed: &Address) -> bool {
        match (self, changed) {
            (Self::Collection, _) => true,
            (Self::Item(_), Self::Collection) => true,
            (Self::Item(watched), Self::Item(changed)) => watched == changed,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Address shape a pattern resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Collection,
    Item,
}

/// Errors raised while building an `AddressMatcher`.
#[derive(Debug)]
pub enum AddressPatternError {
    InvalidAuthority(String),
    EmptyTemplate,
    DuplicateTemplate(String),
    /// Item patterns need exactly one `#` id wildcard.
    MissingIdWildcard(String),
    /// Collection patterns must not capture an id.
    UnexpectedIdWildcard(String),
    NoPatterns,
    Regex(regex::Error),
}

impl Display for AddressPatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAuthority(value) => write!(f, "invalid address authority `{value}`"),
            Self::EmptyTemplate => write!(f, "address template cannot be empty"),
            Self::DuplicateTemplate(value) => {
                write!(f, "address template already registered: {value}")
            }
            Self::MissingIdWildcard(value) => {
                write!(f, "item template `{value}` needs exactly one `#` wildcard")
            }
            Self::UnexpectedIdWildcard(value) => {
                write!(f, "collection template `{value}` must not contain `#`")
            }
            Self::NoPatterns => write!(f, "address matcher has no patterns"),
            Self::Regex(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AddressPatternError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Regex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<regex::Error> for AddressPatternError {
    fn from(value: regex::Error) -> Self {
        Self::Regex(value)
    }
}

#[derive(Debug, Clone)]
struct AddressPattern {
    template: String,
    regex: Regex,
    kind: AddressKind,
}

/// Immutable table of (path pattern, kind) scoped to one authority.
#[derive(Debug, Clone)]
pub struct AddressMatcher {
    authority: String,
    patterns: Vec<AddressPattern>,
}

impl AddressMatcher {
    pub fn builder(authority: impl Into<String>) -> AddressMatcherBuilder {
        AddressMatcherBuilder {
            authority: authority.into(),
            patterns: Vec::new(),
        }
    }

    /// Matcher with the two record patterns (`records`, `records/#`).
    pub fn for_records(authority: impl Into<String>) -> Result<Self, AddressPatternError> {
        Self::builder(authority)
            .add(COLLECTION_TEMPLATE, AddressKind::Collection)?
            .add(ITEM_TEMPLATE, AddressKind::Item)?
            .build()
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Matches a string address; `None` when nothing matches.
    pub fn match_uri(&self, uri: &str) -> Option<Address> {
        let (authority, path) = split_uri(uri)?;
        if authority != self.authority {
            return None;
        }
        let path = path.strip_suffix('/').unwrap_or(path);

        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.regex.captures(path)?;
            match pattern.kind {
                AddressKind::Collection => Some(Address::Collection),
                AddressKind::Item => captures
                    .get(1)
                    .and_then(|id| id.as_str().parse::<RecordId>().ok())
                    .map(Address::Item),
            }
        })
    }

    /// Resolves a string address or fails with `InvalidAddress`.
    pub fn resolve(&self, uri: &str) -> StoreResult<Address> {
        self.match_uri(uri)
            .ok_or_else(|| StoreError::InvalidAddress(uri.to_string()))
    }

    /// String form of `address` under this matcher's authority.
    pub fn uri_for(&self, address: &Address) -> String {
        address.to_uri(&self.authority)
    }

    /// MIME-like type tag for `address`. Depends only on address shape.
    pub fn type_for(&self, address: &Address) -> String {
        match address.kind() {
            AddressKind::Collection => list_type(&self.authority),
            AddressKind::Item => item_type(&self.authority),
        }
    }

    /// Registered templates in match order.
    pub fn templates(&self) -> impl Iterator<Item = (&str, AddressKind)> {
        self.patterns
            .iter()
            .map(|pattern| (pattern.template.as_str(), pattern.kind))
    }
}

/// Collects patterns before freezing them into an `AddressMatcher`.
#[derive(Debug)]
pub struct AddressMatcherBuilder {
    authority: String,
    patterns: Vec<AddressPattern>,
}

impl AddressMatcherBuilder {
    /// Registers a path template. `#` is an integer id wildcard, `*` matches
    /// any single segment.
    pub fn add(mut self, template: &str, kind: AddressKind) -> Result<Self, AddressPatternError> {
        let template = template.trim().trim_matches('/');
        if template.is_empty() {
            return Err(AddressPatternError::EmptyTemplate);
        }
        if self
            .patterns
            .iter()
            .any(|pattern| pattern.template == template)
        {
            return Err(AddressPatternError::DuplicateTemplate(template.to_string()));
        }

        let id_wildcards = template.split('/').filter(|segment| *segment == "#").count();
        match kind {
            AddressKind::Item if id_wildcards != 1 => {
                return Err(AddressPatternError::MissingIdWildcard(template.to_string()));
            }
            AddressKind::Collection if id_wildcards != 0 => {
                return Err(AddressPatternError::UnexpectedIdWildcard(
                    template.to_string(),
                ));
            }
            _ => {}
        }

        let regex = Regex::new(&template_to_regex(template))?;
        self.patterns.push(AddressPattern {
            template: template.to_string(),
            regex,
            kind,
        });
        Ok(self)
    }

    pub fn build(self) -> Result<AddressMatcher, AddressPatternError> {
        let authority = self.authority.trim();
        if authority.is_empty() || authority.contains('/') || authority.contains(':') {
            return Err(AddressPatternError::InvalidAuthority(self.authority));
        }
        if self.patterns.is_empty() {
            return Err(AddressPatternError::NoPatterns);
        }

        Ok(AddressMatcher {
            authority: authority.to_string(),
            patterns: self.patterns,
        })
    }
}

/// Anything a store operation can be addressed with.
pub trait AddressLike {
    fn resolve_with(&self, matcher: &AddressMatcher) -> StoreResult<Address>;
}

impl AddressLike for Address {
    fn resolve_with(&self, _matcher: &AddressMatcher) -> StoreResult<Address> {
        Ok(*self)
    }
}

impl AddressLike for str {
    fn resolve_with(&self, matcher: &AddressMatcher) -> StoreResult<Address> {
        matcher.resolve(self)
    }
}

impl AddressLike for String {
    fn resolve_with(&self, matcher: &AddressMatcher) -> StoreResult<Address> {
        matcher.resolve(self)
    }
}

impl<T: AddressLike + ?Sized> AddressLike for &T {
    fn resolve_with(&self, matcher: &AddressMatcher) -> StoreResult<Address> {
        (**self).resolve_with(matcher)
    }
}

fn template_to_regex(template: &str) -> String {
    let segments = template
        .split('/')
        .map(|segment| match segment {
            "#" => r"(\d+)".to_string(),
            "*" => "[^/]+".to_string(),
            literal => regex::escape(literal),
        })
        .collect::<Vec<_>>();
    format!("^{}$", segments.join("/"))
}

fn split_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.trim();
    let rest = rest.strip_prefix(CONTENT_SCHEME).unwrap_or(rest);
    if rest.contains("://") {
        return None;
    }
    let rest = match rest.find(['?', '#']) {
        Some(end) => &rest[..end],
        None => rest,
    };
    rest.split_once('/')
}
