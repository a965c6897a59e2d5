//! External Graphviz-compatible layout engine.
//!
//! Renders the visible subgraph to DOT, pipes it through an external
//! `dot`-compatible binary with `-Tplain` output, and parses the node
//! positions back into a uniform [`LayoutResult`]. All failure modes —
//! spawn errors, nonzero exit, unparseable output, timeout — surface as
//! [`LayoutError`]; a failed run never yields partial positions.

use super::{layout_node_ids, AsyncLayoutEngine, LayoutError, LayoutOptions, LayoutResult};
use crate::scene::SceneGraph;
use async_trait::async_trait;
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DotLayout {
    /// Binary to invoke (`dot`, `neato`, `fdp`, ...).
    pub command: String,
    /// Multiplier from Graphviz plain-format units to world units.
    pub scale: f32,
    /// Abandon the external process after this long.
    pub timeout: Duration,
}

impl Default for DotLayout {
    fn default() -> Self {
        Self {
            command: "dot".to_string(),
            scale: 72.0,
            timeout: Duration::from_secs(10),
        }
    }
}

impl DotLayout {
    /// Emit DOT source for the subgraph covering `node_ids`.
    fn emit_dot(scene: &SceneGraph, node_ids: &[String]) -> String {
        let wanted: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
        let mut out = String::from("digraph scene {\n");
        for id in node_ids {
            out.push_str(&format!("  {};\n", quote(id)));
        }
        for edge in scene.graph().edges().iter() {
            if wanted.contains(edge.source()) && wanted.contains(edge.target()) {
                out.push_str(&format!(
                    "  {} -> {};\n",
                    quote(edge.source()),
                    quote(edge.target())
                ));
            }
        }
        out.push_str("}\n");
        out
    }

    /// Parse `-Tplain` output: `node <name> <x> <y> <w> <h> ...` lines.
    fn parse_plain(&self, output: &str) -> Result<HashMap<String, Vec3>, LayoutError> {
        let mut positions = HashMap::new();
        for line in output.lines() {
            let mut parts = line.split_whitespace();
            if parts.next() != Some("node") {
                continue;
            }
            let (Some(name), Some(x), Some(y)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(LayoutError::Failed(format!("malformed plain line: {line}")));
            };
            let x: f32 = x
                .parse()
                .map_err(|_| LayoutError::Failed(format!("bad x coordinate: {line}")))?;
            let y: f32 = y
                .parse()
                .map_err(|_| LayoutError::Failed(format!("bad y coordinate: {line}")))?;
            positions.insert(
                unquote(name).to_string(),
                Vec3::new(x * self.scale, y * self.scale, 0.0),
            );
        }
        if positions.is_empty() {
            return Err(LayoutError::Failed("plain output contained no nodes".into()));
        }
        Ok(positions)
    }
}

#[async_trait]
impl AsyncLayoutEngine for DotLayout {
    fn kind(&self) -> &'static str {
        "dot"
    }

    async fn compute(
        &self,
        scene: &SceneGraph,
        options: &LayoutOptions,
    ) -> Result<LayoutResult, LayoutError> {
        let node_ids = layout_node_ids(scene, options);
        if node_ids.is_empty() {
            return Err(LayoutError::Failed("no nodes to lay out".into()));
        }
        let source = Self::emit_dot(scene, &node_ids);
        debug!(command = %self.command, nodes = node_ids.len(), "running external layout");

        let mut child = Command::new(&self.command)
            .arg("-Tplain")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // The stdin write can block too (a stalled process that never
        // drains the pipe), so the whole write-then-wait pipeline runs
        // under one timeout.
        let stdin = child.stdin.take();
        let run = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(source.as_bytes()).await?;
                // Close stdin so the process sees EOF.
                drop(stdin);
            }
            child.wait_with_output().await
        };
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| LayoutError::TimedOut(self.timeout))??;

        if !output.status.success() {
            return Err(LayoutError::Failed(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let positions = self.parse_plain(&String::from_utf8_lossy(&output.stdout))?;
        Ok(LayoutResult {
            positions,
            layout_kind: self.kind().to_string(),
            artwork: None,
        })
    }
}

/// Quote an id as a DOT identifier.
fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Strip the quoting Graphviz echoes back in plain output.
fn unquote(name: &str) -> &str {
    name.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(name)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_model::GraphBuilder;

    fn scene() -> SceneGraph {
        let mut builder = GraphBuilder::new();
        builder.triple("a", "r", "b").triple("b", "r", "c");
        SceneGraph::new(builder.build())
    }

    #[test]
    fn test_emit_dot_covers_subgraph() {
        let scene = scene();
        let source = DotLayout::emit_dot(&scene, &scene.visible_node_ids());
        assert!(source.starts_with("digraph scene {"));
        assert!(source.contains("\"a\" -> \"b\";"));
        assert!(source.contains("\"b\" -> \"c\";"));
    }

    #[test]
    fn test_emit_dot_quotes_awkward_ids() {
        let mut builder = GraphBuilder::new();
        builder.triple("node \"one\"", "r", "two");
        let scene = SceneGraph::new(builder.build());
        let source = DotLayout::emit_dot(&scene, &scene.visible_node_ids());
        assert!(source.contains("\"node \\\"one\\\"\""));
    }

    #[test]
    fn test_parse_plain_output() {
        let engine = DotLayout {
            scale: 10.0,
            ..Default::default()
        };
        let plain = "graph 1 2.5 3.5\n\
                     node a 1.0 2.0 0.75 0.5 a solid ellipse black lightgrey\n\
                     node \"b\" 3.0 4.0 0.75 0.5 b solid ellipse black lightgrey\n\
                     edge a b 4 1.1 2.2 1.5 2.5 2.0 3.0 2.8 3.8 solid black\n\
                     stop\n";
        let positions = engine.parse_plain(plain).unwrap();
        assert_eq!(positions["a"], Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(positions["b"], Vec3::new(30.0, 40.0, 0.0));
    }

    #[test]
    fn test_parse_plain_rejects_garbage() {
        let engine = DotLayout::default();
        assert!(engine.parse_plain("node a not-a-number 2\n").is_err());
        assert!(engine.parse_plain("stop\n").is_err());
    }

    #[tokio::test]
    async fn test_stalled_process_hits_timeout_even_mid_write() {
        use std::io::Write as _;
        use std::os::unix::fs::PermissionsExt;

        // A process that never reads stdin and never exits.
        let path = std::env::temp_dir().join(format!("kgraph-stall-{}.sh", std::process::id()));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"#!/bin/sh\nsleep 30\n")
            .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Enough edges that the DOT source overflows the pipe buffer,
        // so the stdin write itself blocks against the stalled process.
        let mut builder = GraphBuilder::new();
        for i in 0..3000 {
            builder.triple(
                format!("node-{i:06}"),
                "r",
                format!("node-{:06}", (i + 1) % 3000),
            );
        }
        let scene = SceneGraph::new(builder.build());

        let engine = DotLayout {
            command: path.to_string_lossy().into_owned(),
            timeout: Duration::from_millis(300),
            ..Default::default()
        };
        let err = engine
            .compute(&scene, &LayoutOptions::default())
            .await
            .unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, LayoutError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_layout_error() {
        let engine = DotLayout {
            command: "kgraph-test-binary-that-does-not-exist".to_string(),
            ..Default::default()
        };
        let err = engine
            .compute(&scene(), &LayoutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LayoutError::Io(_)));
    }
}
