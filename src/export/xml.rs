// src/export/xml.rs

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use crate::errors::{Result, Trakem2Error};
use crate::tree::{Confidence, LayerId, NodeId, Payload, Tree};

/// Element name of the tree, chosen by the payload kind.
fn tree_tag<P: Payload>() -> &'static str {
    match P::ATTRIBUTE {
        Some("r") => "t2_treeline",
        _ => "t2_tree",
    }
}

enum Step {
    Open(NodeId, usize),
    Close(usize),
}

/// Append the XML element for `tree` to `out`, indented by `indent`.
///
/// Nodes nest by parentage; each carries `x`, `y`, `lid` (layer), `c` (edge
/// confidence) and the payload attribute, e.g. `r="2.5"` for radii.
pub fn write_tree<P: Payload, W: fmt::Write>(tree: &Tree<P>, indent: &str, out: &mut W) -> fmt::Result {
    let meta = tree.meta();
    let tag = tree_tag::<P>();
    let [a, b, c, d, e, f] = meta.transform.as_coeffs();

    writeln!(out, "{indent}<{tag}")?;
    writeln!(out, "{indent}\toid=\"{}\"", meta.id)?;
    writeln!(out, "{indent}\ttitle=\"{}\"", escape_attr(&meta.title))?;
    writeln!(out, "{indent}\ttransform=\"matrix({a},{b},{c},{d},{e},{f})\"")?;
    writeln!(
        out,
        "{indent}\tstyle=\"fill:none;stroke-opacity:{};stroke:{};stroke-width:1.0px;\"",
        meta.alpha, meta.color
    )?;
    writeln!(out, "{indent}\tvisible=\"{}\"", meta.visible)?;
    writeln!(out, "{indent}\tlocked=\"{}\"", meta.locked)?;
    writeln!(out, "{indent}>")?;

    let mut stack: Vec<Step> = tree.root().map(|r| Step::Open(r, 1)).into_iter().collect();
    while let Some(step) = stack.pop() {
        match step {
            Step::Close(depth) => {
                let pad = "\t".repeat(depth);
                writeln!(out, "{indent}{pad}</t2_node>")?;
            }
            Step::Open(id, depth) => {
                let Some(node) = tree.node(id) else {
                    continue;
                };
                let pad = "\t".repeat(depth);
                write!(
                    out,
                    "{indent}{pad}<t2_node x=\"{}\" y=\"{}\" lid=\"{}\"",
                    node.x(),
                    node.y(),
                    node.layer()
                )?;
                if node.parent().is_some() {
                    write!(out, " c=\"{}\"", node.confidence().value())?;
                }
                if let Some(name) = P::ATTRIBUTE {
                    write!(out, " {name}=\"{}\"", escape_attr(&node.data().format_attribute()))?;
                }
                if node.is_leaf() {
                    writeln!(out, " />")?;
                } else {
                    writeln!(out, ">")?;
                    stack.push(Step::Close(depth));
                    stack.extend(node.children().iter().rev().map(|c| Step::Open(*c, depth + 1)));
                }
            }
        }
    }

    writeln!(out, "{indent}</{tag}>")
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Node fields recovered from a `<t2_node>` attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord<P> {
    pub x: f32,
    pub y: f32,
    /// Absent when the element was written without a layer.
    pub layer: Option<LayerId>,
    pub confidence: Confidence,
    pub data: P,
}

/// Rebuild a node record from parsed attributes. A missing payload attribute
/// yields the payload's default value.
pub fn node_from_attributes<P: Payload>(attrs: &HashMap<String, String>) -> Result<NodeRecord<P>> {
    let x = parse_attr::<f32>(attrs, "x")?.unwrap_or(0.0);
    let y = parse_attr::<f32>(attrs, "y")?.unwrap_or(0.0);
    let layer = parse_attr::<u64>(attrs, "lid")?.map(LayerId);
    let confidence = parse_attr::<u8>(attrs, "c")?
        .map(Confidence::new)
        .unwrap_or_default();
    let data = match P::ATTRIBUTE.and_then(|name| attrs.get(name)) {
        Some(value) => P::parse_attribute(value)?,
        None => P::default(),
    };
    Ok(NodeRecord {
        x,
        y,
        layer,
        confidence,
        data,
    })
}

fn parse_attr<T: std::str::FromStr>(attrs: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    match attrs.get(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Trakem2Error::InvalidAttribute {
                name: name.to_string(),
                value: value.clone(),
            }),
    }
}
