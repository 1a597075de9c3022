//! Host bundler configuration
//!
//! The host owns its configuration; the plugin only patches it. Several
//! fields accept more than one shape (an alias mapping or list, an ignore
//! list or predicate). Each is normalized once here before merging.

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Default public base path
pub const DEFAULT_BASE: &str = "./";

/// Resolves an aliased specifier to a file path
#[async_trait]
pub trait AliasResolver: Send + Sync + fmt::Debug {
    /// `Ok(None)` leaves the rewritten specifier to the host's own resolution
    async fn resolve(&self, specifier: &str, importer: Option<&str>) -> anyhow::Result<Option<String>>;
}

/// What an alias matches
#[derive(Debug, Clone)]
pub enum AliasPattern {
    /// The exact specifier or any subpath of it (`find` or `find/...`)
    Exact(String),
    /// A regular expression; `$n` in the replacement refers to its groups
    Regex(Regex),
}

impl AliasPattern {
    pub fn matches(&self, specifier: &str) -> bool {
        match self {
            Self::Exact(find) => {
                specifier == find
                    || specifier
                        .strip_prefix(find.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Regex(re) => re.is_match(specifier),
        }
    }

    fn replace(&self, specifier: &str, replacement: &str) -> String {
        match self {
            Self::Exact(find) => format!("{}{}", replacement, &specifier[find.len()..]),
            Self::Regex(re) => re.replace(specifier, replacement).into_owned(),
        }
    }

    fn source(&self) -> &str {
        match self {
            Self::Exact(find) => find,
            Self::Regex(re) => re.as_str(),
        }
    }
}

impl PartialEq for AliasPattern {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Exact(_), Self::Exact(_)) | (Self::Regex(_), Self::Regex(_))
        ) && self.source() == other.source()
    }
}

/// One entry of the host's ordered alias list
#[derive(Clone)]
pub struct Alias {
    pub find: AliasPattern,
    pub replacement: String,
    pub custom_resolver: Option<Arc<dyn AliasResolver>>,
    /// Plugin that installed the alias; `None` for user aliases
    pub owner: Option<Cow<'static, str>>,
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias")
            .field("find", &self.find)
            .field("replacement", &self.replacement)
            .field("custom_resolver", &self.custom_resolver.is_some())
            .field("owner", &self.owner)
            .finish()
    }
}

impl Alias {
    /// Plain user alias
    pub fn new(find: AliasPattern, replacement: impl Into<String>) -> Self {
        Self {
            find,
            replacement: replacement.into(),
            custom_resolver: None,
            owner: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AliasResolver>) -> Self {
        self.custom_resolver = Some(resolver);
        self
    }

    pub fn owned_by(mut self, owner: impl Into<Cow<'static, str>>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Aliases as the user may write them
#[derive(Debug, Clone)]
pub enum AliasInput {
    /// `{ find: replacement }`, matched as exact specifiers in insertion order
    Map(IndexMap<String, String>),
    List(Vec<Alias>),
}

impl Default for AliasInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl AliasInput {
    /// Ordered-list form
    pub fn into_list(self) -> Vec<Alias> {
        match self {
            Self::List(list) => list,
            Self::Map(map) => map
                .into_iter()
                .map(|(find, replacement)| Alias::new(AliasPattern::Exact(find), replacement))
                .collect(),
        }
    }
}

/// Predicate form of the CommonJS ignore option
pub type IgnorePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Module ids the host's CommonJS transform leaves alone
#[derive(Clone)]
pub enum IgnoreRule {
    List(Vec<String>),
    Predicate(IgnorePredicate),
    /// A user predicate plus the ids of the latest plugin pass
    Extended {
        predicate: IgnorePredicate,
        ids: Vec<String>,
    },
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
            Self::Predicate(_) => f.write_str("Predicate(<fn>)"),
            Self::Extended { ids, .. } => f
                .debug_struct("Extended")
                .field("predicate", &"<fn>")
                .field("ids", ids)
                .finish(),
        }
    }
}

impl IgnoreRule {
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::List(list) => list.iter().any(|entry| entry == id),
            Self::Predicate(predicate) => predicate(id),
            Self::Extended { predicate, ids } => {
                predicate(id) || ids.iter().any(|entry| entry == id)
            }
        }
    }

    /// Also ignore every id in `ids`, keeping the existing rule's semantics.
    ///
    /// A list keeps its entries and gains the missing ids. A predicate is
    /// kept as-is next to `ids`, which replace the ids of an earlier merge.
    pub fn merge(self, ids: Vec<String>) -> Self {
        match self {
            Self::List(mut list) => {
                append_missing(&mut list, ids);
                Self::List(list)
            }
            Self::Predicate(predicate) | Self::Extended { predicate, .. } => {
                let mut merged = Vec::new();
                append_missing(&mut merged, ids);
                Self::Extended {
                    predicate,
                    ids: merged,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Freeze emitted namespace objects; `None` leaves the host default
    pub freeze: Option<bool>,
    pub format: Option<String>,
}

/// One output or several
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTargets {
    Single(OutputOptions),
    Multiple(Vec<OutputOptions>),
}

impl OutputTargets {
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutputOptions> {
        match self {
            Self::Single(output) => std::slice::from_mut(output).iter_mut(),
            Self::Multiple(outputs) => outputs.iter_mut(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RollupOptions {
    pub output: Option<OutputTargets>,
}

#[derive(Debug, Clone, Default)]
pub struct CommonjsOptions {
    pub ignore: Option<IgnoreRule>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub rollup_options: RollupOptions,
    pub commonjs_options: CommonjsOptions,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveConfig {
    pub alias: Option<AliasInput>,
}

#[derive(Debug, Clone, Default)]
pub struct OptimizeDepsConfig {
    pub exclude: Vec<String>,
}

/// The host's configuration, as far as the plugin reads or writes it
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub base: Option<String>,
    pub build: BuildConfig,
    pub resolve: ResolveConfig,
    pub optimize_deps: OptimizeDepsConfig,
}

/// Changes a plugin makes to the host configuration
#[derive(Debug, Clone, Default)]
pub struct HostPatch {
    /// Installed after the user's aliases
    pub aliases: Vec<Alias>,
    /// Ids the CommonJS transform must skip
    pub commonjs_ignore: Vec<String>,
    /// Ids dependency pre-optimization must skip
    pub optimize_deps_exclude: Vec<String>,
}

impl HostConfig {
    /// Apply `patch`.
    ///
    /// Re-applying a patch from the same owner replaces its earlier aliases
    /// and never duplicates list entries.
    pub fn apply(&mut self, patch: HostPatch) {
        if self.base.is_none() {
            self.base = Some(DEFAULT_BASE.to_string());
        }

        let output = self
            .build
            .rollup_options
            .output
            .get_or_insert_with(|| OutputTargets::Single(OutputOptions::default()));
        for target in output.iter_mut() {
            target.freeze = Some(false);
        }

        self.build.commonjs_options.ignore = Some(match self.build.commonjs_options.ignore.take() {
            Some(rule) => rule.merge(patch.commonjs_ignore),
            None => {
                let mut fresh = Vec::new();
                append_missing(&mut fresh, patch.commonjs_ignore);
                IgnoreRule::List(fresh)
            }
        });

        let mut aliases = self
            .resolve
            .alias
            .take()
            .map(AliasInput::into_list)
            .unwrap_or_default();
        let owners: Vec<_> = patch.aliases.iter().filter_map(|a| a.owner.clone()).collect();
        aliases.retain(|alias| alias.owner.as_ref().is_none_or(|owner| !owners.contains(owner)));
        aliases.extend(patch.aliases);
        self.resolve.alias = Some(AliasInput::List(aliases));

        append_missing(&mut self.optimize_deps.exclude, patch.optimize_deps_exclude);
    }

    /// Aliases in match order
    pub fn aliases(&self) -> &[Alias] {
        match &self.resolve.alias {
            Some(AliasInput::List(list)) => list,
            _ => &[],
        }
    }

    /// Run `specifier` through the alias list the way the host does: the
    /// first matching alias rewrites it, then its custom resolver (if any)
    /// gets the rewritten specifier.
    ///
    /// Returns `None` when no alias matches.
    pub async fn resolve_alias(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> anyhow::Result<Option<String>> {
        let normalized;
        let aliases: &[Alias] = match &self.resolve.alias {
            Some(AliasInput::Map(_)) => {
                normalized = self.resolve.alias.clone().map(AliasInput::into_list).unwrap_or_default();
                &normalized
            }
            _ => self.aliases(),
        };

        let Some(alias) = aliases.iter().find(|alias| alias.find.matches(specifier)) else {
            return Ok(None);
        };

        let rewritten = alias.find.replace(specifier, &alias.replacement);
        if let Some(resolver) = &alias.custom_resolver {
            if let Some(resolved) = resolver.resolve(&rewritten, importer).await? {
                return Ok(Some(resolved));
            }
        }
        Ok(Some(rewritten))
    }
}

fn append_missing(list: &mut Vec<String>, ids: Vec<String>) {
    for id in ids {
        if !list.contains(&id) {
            list.push(id);
        }
    }
}
