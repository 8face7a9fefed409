//! Request-time resolution against a compiled [`PrefixMap`].
//!
//! Each node is tried in a fixed order: exact literal, then the single prefix
//! sharing the input's first character, then every regex branch in key order.
//! A failed prefix descent falls through to the regex branches.

use std::collections::HashMap;
use std::ops::Bound;

use regex::{Captures, Regex};

use crate::compile::{compile, BranchResult, PrefixMap};
use crate::error::Result;
use crate::types::RouteMatch;

type Params = HashMap<String, String>;

/// Compiled regexes for one fragment
#[derive(Debug)]
struct FragmentRegex {
    /// Anchored at the start only, for branches with a child node
    prefix: Regex,
    /// Anchored at both ends, for terminal branches
    full: Regex,
}

impl FragmentRegex {
    fn new(fragment: &str) -> Result<Self> {
        Ok(Self {
            prefix: Regex::new(&format!("^(?:{})", fragment))?,
            full: Regex::new(&format!("^(?:{})$", fragment))?,
        })
    }
}

/// Resolves paths against a prefix map
#[derive(Debug)]
pub struct PrefixMatcher<T> {
    map: PrefixMap<T>,
    regexes: HashMap<String, FragmentRegex>,
}

impl<T> PrefixMatcher<T> {
    /// Create a matcher, compiling every regex fragment in the tree once
    pub fn new(map: PrefixMap<T>) -> Result<Self> {
        let mut regexes = HashMap::new();
        collect_regexes(&map, &mut regexes)?;
        Ok(Self { map, regexes })
    }

    /// Compile routes and build a matcher over them
    pub fn from_routes<I, S>(routes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        Self::new(compile(routes)?)
    }

    /// The underlying tree
    pub fn prefix_map(&self) -> &PrefixMap<T> {
        &self.map
    }

    /// Resolve a path to its payload and captured parameters
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        self.resolve_in(&self.map, path)
            .map(|(payload, params)| RouteMatch { payload, params })
    }

    fn resolve_in<'a>(&'a self, map: &'a PrefixMap<T>, path: &str) -> Option<(&'a T, Params)> {
        if let Some(payload) = map.literals().get(path) {
            return Some((payload, Params::new()));
        }

        if let Some((prefix, child)) = find_prefix(map, path) {
            if let Some(found) = self.resolve_in(child, &path[prefix.len()..]) {
                return Some(found);
            }
        }

        for (fragment, branch) in map.regexps_in_order() {
            let Some(regex) = self.regexes.get(fragment) else {
                continue;
            };
            match branch {
                BranchResult::Terminal(payload) => {
                    if let Some(caps) = regex.full.captures(path) {
                        let mut params = Params::new();
                        collect_params(&regex.full, &caps, &mut params);
                        return Some((payload, params));
                    }
                }
                BranchResult::Map(child) => {
                    let Some(caps) = regex.prefix.captures(path) else {
                        continue;
                    };
                    let consumed = caps.get(0).map_or(0, |m| m.end());
                    if let Some((payload, inner)) = self.resolve_in(child, &path[consumed..]) {
                        let mut params = Params::new();
                        collect_params(&regex.prefix, &caps, &mut params);
                        params.extend(inner);
                        return Some((payload, params));
                    }
                }
            }
        }

        None
    }
}

/// The prefix entry sharing `path`'s first character, if `path` starts with it.
///
/// Prefix keys at one node never share a first character, so the first key
/// at or after that character is the only candidate.
fn find_prefix<'m, T>(map: &'m PrefixMap<T>, path: &str) -> Option<(&'m String, &'m PrefixMap<T>)> {
    let first = path.chars().next()?;
    let mut buf = [0u8; 4];
    let start: &str = first.encode_utf8(&mut buf);
    map.prefixes()
        .range::<str, _>((Bound::Included(start), Bound::Unbounded))
        .next()
        .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
}

fn collect_regexes<T>(map: &PrefixMap<T>, regexes: &mut HashMap<String, FragmentRegex>) -> Result<()> {
    for child in map.prefixes().values() {
        collect_regexes(child, regexes)?;
    }
    for (fragment, branch) in map.regexps() {
        if !regexes.contains_key(fragment) {
            regexes.insert(fragment.clone(), FragmentRegex::new(fragment)?);
        }
        if let BranchResult::Map(child) = branch {
            collect_regexes(child, regexes)?;
        }
    }
    Ok(())
}

fn collect_params(regex: &Regex, caps: &Captures<'_>, params: &mut Params) {
    for name in regex.capture_names().flatten() {
        if let Some(value) = caps.name(name) {
            params.insert(name.to_string(), value.as_str().to_string());
        }
    }
}
