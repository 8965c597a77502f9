//! Asset URL parser for the pipeline's `?tr=` transformation chains.
//!
//! Built on `winnow` 0.7. A hosted asset URL looks like
//! `https://cdn.example/u/photo.png?tr=e-retouch,w-800`; each comma-separated
//! step is `key-value` (or a bare flag). Rebuilding a URL keeps only the base
//! and the chain, matching how the pipeline addresses derived assets.

use std::fmt;
use winnow::combinator::{opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// One step of a transformation chain, e.g. `e-retouch` or `w-800`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub key: String,
    pub value: Option<String>,
}

impl Transformation {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Split a raw step at its first `-`.
    pub fn from_step(step: &str) -> Self {
        match step.split_once('-') {
            Some((key, value)) => Self::new(key, value),
            None => Self::flag(step),
        }
    }

    /// True for effect steps (`e-<name>`) with the given name.
    pub fn is_effect(&self, name: &str) -> bool {
        self.key == "e" && self.value.as_deref() == Some(name)
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}-{}", self.key, v),
            None => f.write_str(&self.key),
        }
    }
}

/// A parsed asset URL: base location plus its transformation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrl {
    base: String,
    chain: Vec<Transformation>,
}

impl AssetUrl {
    /// Parse an asset URL. Query parameters other than `tr` are discarded.
    #[must_use = "parsing result should be used"]
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut rest = input.trim();
        let url = parse_asset_url
            .parse_next(&mut rest)
            .map_err(|e| format!("Asset URL parse error: {e}"))?;
        if !rest.is_empty() {
            return Err(format!("Asset URL parse error: trailing input `{rest}`"));
        }
        Ok(url)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.chain
    }

    /// The same asset with its chain replaced.
    pub fn with_chain(&self, chain: Vec<Transformation>) -> Self {
        Self {
            base: self.base.clone(),
            chain,
        }
    }

    /// The same asset with `steps` appended to the existing chain.
    pub fn appended<I>(&self, steps: I) -> Self
    where
        I: IntoIterator<Item = Transformation>,
    {
        let mut chain = self.chain.clone();
        chain.extend(steps);
        self.with_chain(chain)
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.chain.iter().any(|t| t.is_effect(name))
    }

    /// Whether this asset was produced by a background removal or swap.
    pub fn is_background_removed(&self) -> bool {
        ["bgremove", "removedotbg", "changebg"]
            .iter()
            .any(|name| self.has_effect(name))
    }

    /// The chain as written in the query, e.g. `e-retouch,w-800`.
    pub fn chain_string(&self) -> String {
        self.chain
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if !self.chain.is_empty() {
            write!(f, "?tr={}", self.chain_string())?;
        }
        Ok(())
    }
}

// ─── Grammar ─────────────────────────────────────────────────────────────

fn parse_asset_url(input: &mut &str) -> ModalResult<AssetUrl> {
    let base = take_till(1.., ['?', '#']).parse_next(input)?;
    let params: Option<Vec<(&str, Option<&str>)>> =
        opt(preceded('?', separated(0.., parse_query_param, '&'))).parse_next(input)?;
    // Fragments never reach the pipeline.
    if input.starts_with('#') {
        *input = "";
    }

    let mut chain = Vec::new();
    for (key, value) in params.unwrap_or_default() {
        if key != "tr" {
            continue;
        }
        let mut tr = value.unwrap_or("");
        if !tr.is_empty() {
            let steps: Vec<&str> = separated(1.., parse_step, ',').parse_next(&mut tr)?;
            chain.extend(steps.into_iter().map(Transformation::from_step));
        }
    }

    Ok(AssetUrl {
        base: base.to_string(),
        chain,
    })
}

fn parse_query_param<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Option<&'a str>)> {
    (
        take_till(1.., ['=', '&', '#']),
        opt(preceded('=', take_till(0.., ['&', '#']))),
    )
        .parse_next(input)
}

fn parse_step<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c != ',').parse_next(input)
}
