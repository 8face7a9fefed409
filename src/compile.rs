use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::parser::parse_pattern;
use crate::types::{Parameter, Segment, DEFAULT_PARAMETER_REGEX};

/// One node of the compiled route tree.
///
/// A lookup at a node consults, in order:
/// - `literals` - the remaining input equals a key exactly
/// - `prefixes` - the remaining input starts with a key; continue in the child
/// - `regexps` - a parameter fragment matches at the start of the remaining input
///
/// Prefix keys are never empty and no two of them share a first character.
/// Regex branches are tried constrained-first, then by regex body, then by
/// capture name (see [`PrefixMap::regexps_in_order`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixMap<T> {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    literals: BTreeMap<String, T>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    prefixes: BTreeMap<String, PrefixMap<T>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    regexps: BTreeMap<String, BranchResult<T>>,
    /// Keys of `regexps` in try-order
    #[serde(skip)]
    regex_order: Vec<String>,
}

/// What a regex branch leads to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BranchResult<T> {
    /// More segments follow; continue matching in this node
    Map(Box<PrefixMap<T>>),
    /// The branch is the last segment of exactly one route
    Terminal(T),
}

impl<T> BranchResult<T> {
    /// Child node, if this branch continues
    pub fn as_map(&self) -> Option<&PrefixMap<T>> {
        match self {
            BranchResult::Map(map) => Some(map),
            BranchResult::Terminal(_) => None,
        }
    }

    /// Payload, if this branch is terminal
    pub fn as_terminal(&self) -> Option<&T> {
        match self {
            BranchResult::Map(_) => None,
            BranchResult::Terminal(payload) => Some(payload),
        }
    }

    /// Check if this branch is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, BranchResult::Terminal(_))
    }
}

/// A route on its way through the builder
struct Entry<T> {
    /// Original pattern text, for error reporting
    pattern: Rc<str>,
    /// Segments not yet consumed by ancestors
    segments: VecDeque<Segment>,
    payload: T,
}

impl<T> PrefixMap<T> {
    /// Compile a pattern -> payload map
    pub fn from_flat_map(map: HashMap<String, T>) -> Result<Self> {
        compile(map)
    }

    /// Compile a list of (pattern, payload) pairs
    pub fn from_routes<I, S>(routes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        compile(routes)
    }

    /// Compile pre-tokenized routes.
    ///
    /// Segments are normalized the way the pattern parser emits them: empty
    /// literals are dropped and adjacent literals merged, so equivalent
    /// sequences collide as duplicates.
    pub fn from_segments<I>(routes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<Segment>, T)>,
    {
        let entries = routes
            .into_iter()
            .map(|(segments, payload)| Entry {
                pattern: render(&segments).into(),
                segments: normalize(segments),
                payload,
            })
            .collect();
        compile_entries(entries)
    }

    /// Exact-literal terminals
    pub fn literals(&self) -> &BTreeMap<String, T> {
        &self.literals
    }

    /// Literal-prefix continuations
    pub fn prefixes(&self) -> &BTreeMap<String, PrefixMap<T>> {
        &self.prefixes
    }

    /// Regex-fragment branches
    pub fn regexps(&self) -> &BTreeMap<String, BranchResult<T>> {
        &self.regexps
    }

    /// Regex branches in the order a resolver should try them.
    ///
    /// Constrained parameters come before ones using the default regex, then
    /// branches sort by regex body. The capture name only breaks ties, so
    /// renaming a parameter never changes which overlapping route wins.
    pub fn regexps_in_order(&self) -> impl Iterator<Item = (&str, &BranchResult<T>)> + '_ {
        self.regex_order.iter().filter_map(|fragment| {
            self.regexps
                .get_key_value(fragment)
                .map(|(key, branch)| (key.as_str(), branch))
        })
    }

    /// Check if the map holds no routes
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.prefixes.is_empty() && self.regexps.is_empty()
    }

    /// Number of nodes in the tree, including this one
    pub fn node_count(&self) -> usize {
        let prefixes: usize = self.prefixes.values().map(PrefixMap::node_count).sum();
        let regexps: usize = self
            .regexps
            .values()
            .filter_map(BranchResult::as_map)
            .map(PrefixMap::node_count)
            .sum();
        1 + prefixes + regexps
    }

    /// Number of routes reachable from this node
    pub fn route_count(&self) -> usize {
        let prefixes: usize = self.prefixes.values().map(PrefixMap::route_count).sum();
        let regexps: usize = self
            .regexps
            .values()
            .map(|branch| match branch {
                BranchResult::Map(map) => map.route_count(),
                BranchResult::Terminal(_) => 1,
            })
            .sum();
        self.literals.len() + prefixes + regexps
    }

    /// Export the tree as nested JSON maps, omitting empty mappings
    pub fn to_debug_json(&self) -> Result<serde_json::Value>
    where
        T: Serialize,
    {
        Ok(serde_json::to_value(self)?)
    }
}

/// Compile route patterns into a prefix map.
///
/// Accepts any list of (pattern, payload) pairs; registering the same route
/// twice is an error rather than "last wins".
pub fn compile<I, S, T>(routes: I) -> Result<PrefixMap<T>>
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
{
    let entries = routes
        .into_iter()
        .map(|(pattern, payload)| {
            let pattern = pattern.as_ref();
            Ok(Entry {
                segments: parse_pattern(pattern)?.into(),
                pattern: pattern.into(),
                payload,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    compile_entries(entries)
}

fn compile_entries<T>(entries: Vec<Entry<T>>) -> Result<PrefixMap<T>> {
    if let Some(entry) = entries.iter().find(|e| e.segments.is_empty()) {
        return Err(RouteError::EmptyPattern {
            pattern: entry.pattern.to_string(),
        });
    }

    let route_count = entries.len();
    let map = build_from(entries)?;
    tracing::debug!(
        routes = route_count,
        nodes = map.node_count(),
        "compiled prefix map"
    );
    Ok(map)
}

/// Partition entries by their first segment and build one node
fn build_from<T>(entries: Vec<Entry<T>>) -> Result<PrefixMap<T>> {
    let mut literals: BTreeMap<String, (Rc<str>, T)> = BTreeMap::new();
    let mut prefix_candidates: BTreeMap<String, Vec<Entry<T>>> = BTreeMap::new();
    let mut regex_candidates: BTreeMap<String, Vec<Entry<T>>> = BTreeMap::new();
    let mut regex_params: HashMap<String, (Parameter, Rc<str>)> = HashMap::new();

    for mut entry in entries {
        match entry.segments.pop_front() {
            // Input fully consumed: only reachable below a regex branch
            None => insert_literal(&mut literals, String::new(), entry)?,
            Some(Segment::Literal(text)) if entry.segments.is_empty() => {
                insert_literal(&mut literals, text, entry)?
            }
            Some(Segment::Literal(text)) => prefix_candidates.entry(text).or_default().push(entry),
            Some(Segment::Parameter(param)) => {
                let fragment = param.regex_fragment();
                match regex_params.get(&fragment) {
                    Some((seen, owner)) if *seen != param => {
                        tracing::warn!(
                            fragment = %fragment,
                            first = %owner,
                            second = %entry.pattern,
                            "merging parameters that render the same regex"
                        );
                    }
                    Some(_) => {}
                    None => {
                        regex_params.insert(fragment.clone(), (param, entry.pattern.clone()));
                    }
                }
                regex_candidates.entry(fragment).or_default().push(entry);
            }
        }
    }

    let mut prefixes = BTreeMap::new();
    if !prefix_candidates.is_empty() {
        let groups =
            group_by_common_prefix(prefix_candidates.keys().cloned()).map_err(|err| match err {
                RouteError::DegenerateGrouping { keys, .. } => RouteError::DegenerateGrouping {
                    keys,
                    patterns: empty_key_patterns(&prefix_candidates),
                },
                other => other,
            })?;
        for (prefix, members) in groups {
            let mut group = Vec::new();
            for key in members {
                let Some(rows) = prefix_candidates.remove(&key) else {
                    continue;
                };
                let suffix = &key[prefix.len()..];
                for mut entry in rows {
                    if !suffix.is_empty() {
                        entry.segments.push_front(Segment::literal(suffix));
                    }
                    group.push(entry);
                }
            }
            prefixes.insert(prefix, build_from(group)?);
        }
    }

    let mut regexps = BTreeMap::new();
    for (fragment, mut group) in regex_candidates {
        let branch = if group.len() == 1 && group[0].segments.is_empty() {
            BranchResult::Terminal(group.swap_remove(0).payload)
        } else {
            BranchResult::Map(Box::new(build_from(group)?))
        };
        regexps.insert(fragment, branch);
    }

    let mut order: Vec<(String, Parameter)> = regex_params
        .into_iter()
        .map(|(fragment, (param, _))| (fragment, param))
        .collect();
    order.sort_by(|(_, a), (_, b)| try_order_key(a).cmp(&try_order_key(b)));

    Ok(PrefixMap {
        literals: literals
            .into_iter()
            .map(|(key, (_, payload))| (key, payload))
            .collect(),
        prefixes,
        regexps,
        regex_order: order.into_iter().map(|(fragment, _)| fragment).collect(),
    })
}

/// Sort key for regex branches: constrained first, then body, then name
fn try_order_key(param: &Parameter) -> (bool, &str, &str) {
    let regex = param.regex();
    (regex == DEFAULT_PARAMETER_REGEX, regex, &param.name)
}

fn empty_key_patterns<T>(candidates: &BTreeMap<String, Vec<Entry<T>>>) -> Vec<String> {
    let mut patterns: Vec<String> = candidates
        .get("")
        .into_iter()
        .flatten()
        .map(|entry| entry.pattern.to_string())
        .collect();
    patterns.sort();
    patterns
}

fn insert_literal<T>(
    literals: &mut BTreeMap<String, (Rc<str>, T)>,
    key: String,
    entry: Entry<T>,
) -> Result<()> {
    if let Some((existing, _)) = literals.get(&key) {
        let mut patterns = vec![existing.to_string(), entry.pattern.to_string()];
        patterns.sort();
        return Err(RouteError::DuplicateRoute { key, patterns });
    }
    literals.insert(key, (entry.pattern, entry.payload));
    Ok(())
}

/// Group literal keys under their shared prefixes.
///
/// Keys are bucketed by first character and each bucket is keyed by the
/// longest prefix common to all of its members, so `{"cat", "car", "dog"}`
/// becomes `{"ca": {"car", "cat"}, "dog": {"dog"}}`. A zero-length key makes
/// grouping meaningless and is rejected.
pub fn group_by_common_prefix<I, S>(keys: I) -> Result<BTreeMap<String, BTreeSet<String>>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
    let Some(min_len) = keys.iter().map(|k| k.chars().count()).min() else {
        return Ok(BTreeMap::new());
    };
    if min_len == 0 {
        return Err(RouteError::DegenerateGrouping {
            keys: keys.into_iter().collect(),
            patterns: Vec::new(),
        });
    }

    let mut buckets: BTreeMap<char, BTreeSet<String>> = BTreeMap::new();
    for key in keys {
        if let Some(first) = key.chars().next() {
            buckets.entry(first).or_default().insert(key);
        }
    }

    Ok(buckets
        .into_values()
        .map(|members| (longest_common_prefix(&members), members))
        .collect())
}

/// Longest common prefix of a sorted set: the one shared by its min and max
fn longest_common_prefix(keys: &BTreeSet<String>) -> String {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return String::new();
    };
    let end = first
        .char_indices()
        .zip(last.chars())
        .find(|((_, a), b)| a != b)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| first.len().min(last.len()));
    first[..end].to_string()
}

fn render(segments: &[Segment]) -> String {
    segments.iter().map(ToString::to_string).collect()
}

/// Drop empty literals and merge adjacent ones
fn normalize(segments: Vec<Segment>) -> VecDeque<Segment> {
    let mut normalized = VecDeque::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) if text.is_empty() => {}
            Segment::Literal(text) => match normalized.back_mut() {
                Some(Segment::Literal(prev)) => prev.push_str(&text),
                _ => normalized.push_back(Segment::Literal(text)),
            },
            param => normalized.push_back(param),
        }
    }
    normalized
}
