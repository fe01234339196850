//! Inspection tools for DMAP messages.
//!
//! This crate provides utilities for looking inside captured DMAP bodies:
//!
//! - Decode a message into its node tree and print it
//! - Summarise its size, node count and nesting depth
//! - Dump a content-code table
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what a server actually sent.

use std::fmt::Write as _;

use wire::{decode, ContentCodeBag, ContentNode, ContentValue, Limits, WireResult};

/// A decoded message plus a few structural facts about it.
#[derive(Debug, Clone)]
pub struct InspectReport {
    pub root: ContentNode,
    pub bytes: usize,
    pub nodes: usize,
    pub depth: usize,
    /// Nodes whose code the bag did not know.
    pub unknown: usize,
}

/// Decodes `bytes` with `bag` and measures the tree.
pub fn inspect(bytes: &[u8], bag: &ContentCodeBag, limits: &Limits) -> WireResult<InspectReport> {
    let root = decode(bag, bytes, limits)?;
    let mut report = InspectReport {
        root,
        bytes: bytes.len(),
        nodes: 0,
        depth: 0,
        unknown: 0,
    };
    let (nodes, depth, unknown) = measure(&report.root, 1);
    report.nodes = nodes;
    report.depth = depth;
    report.unknown = unknown;
    Ok(report)
}

fn measure(node: &ContentNode, level: usize) -> (usize, usize, usize) {
    match &node.value {
        ContentValue::Container(children) => children.iter().fold(
            (1, level, 0),
            |(nodes, depth, unknown), child| {
                let (n, d, u) = measure(child, level + 1);
                (nodes + n, depth.max(d), unknown + u)
            },
        ),
        ContentValue::Unknown { .. } => (1, level, 1),
        _ => (1, level, 0),
    }
}

/// The bag to decode with: the built-in codes, or the codes carried in a
/// captured `/content-codes` body.
pub fn load_bag(codes: Option<&[u8]>, limits: &Limits) -> WireResult<ContentCodeBag> {
    match codes {
        Some(blob) => ContentCodeBag::parse_codes(blob, limits),
        None => Ok(ContentCodeBag::builtin()),
    }
}

/// Renders a node tree, one node per line, indented by depth.
#[must_use]
pub fn format_tree(node: &ContentNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &ContentNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let _ = match &node.value {
        ContentValue::Container(children) => {
            let _ = writeln!(out, "{pad}{} ({} children)", node.name, children.len());
            for child in children {
                write_node(out, child, indent + 1);
            }
            Ok(())
        }
        ContentValue::Byte(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::SignedByte(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::Short(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::Int(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::Long(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::String(v) => writeln!(out, "{pad}{}: {v:?}", node.name),
        ContentValue::Date(v) => writeln!(out, "{pad}{}: {}", node.name, v.to_rfc3339()),
        ContentValue::Version(v) => writeln!(out, "{pad}{}: {v}", node.name),
        ContentValue::Unknown { code, bytes } => {
            writeln!(out, "{pad}{code}: <unknown, {} bytes>", bytes.len())
        }
    };
}

/// Renders a bag as `mnemonic  type  name` rows in insertion order.
#[must_use]
pub fn format_codes(bag: &ContentCodeBag) -> String {
    let mut out = String::new();
    for code in bag.iter() {
        let _ = writeln!(
            out,
            "{:<10} {:<12} {}",
            code.number.to_string(),
            code.content_type.to_string(),
            code.name
        );
    }
    out
}
