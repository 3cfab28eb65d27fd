//! Graph dumps for inspection with Graphviz or spreadsheet tools.
use crate::graph::Graph;
use crate::Result;
use std::io::Write;

/// Writes the live graph in Graphviz format, edges labelled with their weight
pub fn write_dot<W: Write>(graph: &Graph, name: &str, mut writer: W) -> Result<()> {
    writeln!(writer, "digraph \"{}\" {{", name.replace('"', "\\\""))?;
    writeln!(writer, "  bgcolor=\"transparent\";")?;
    for (_, node) in graph.nodes() {
        let label = node.label();
        writeln!(writer, "  \"{}\" [label=\"{}\"];", label, label)?;
    }
    for (from, to, weight) in graph.edges() {
        if let (Some(from), Some(to)) = (graph.node(from), graph.node(to)) {
            writeln!(
                writer,
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                from.label(),
                to.label(),
                weight
            )?;
        }
    }
    writeln!(writer, "}}")?;
    writer.flush()?;
    Ok(())
}

/// Writes one tab separated `source target weight` row per live edge
pub fn write_edge_table<W: Write>(graph: &Graph, mut writer: W) -> Result<()> {
    writeln!(writer, "Source\tTarget\tweight")?;
    for (from, to, weight) in graph.edges() {
        if let (Some(from), Some(to)) = (graph.node(from), graph.node(to)) {
            writeln!(writer, "{}\t{}\t{}", from.label(), to.label(), weight)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let graph = Graph::from_reads(vec!["ACGT"], 3);
        let mut out = Vec::new();
        write_dot(&graph, "toy", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "digraph \"toy\" {\n  bgcolor=\"transparent\";\n  \"AC\" [label=\"AC\"];\n  \
             \"CG\" [label=\"CG\"];\n  \"GT\" [label=\"GT\"];\n  \"AC\" -> \"CG\" [label=\"1\"];\n  \
             \"CG\" -> \"GT\" [label=\"1\"];\n}\n"
        );
    }

    #[test]
    fn test_edge_table() {
        let mut graph = Graph::from_reads(vec!["ACGTACGT"], 3);
        graph.prune_weak_edges(1.0);
        let mut out = Vec::new();
        write_edge_table(&graph, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Source\tTarget\tweight\nAC\tCG\t2\nCG\tGT\t2\n"
        );
    }

    #[test]
    fn test_empty_graph() {
        let mut out = Vec::new();
        write_edge_table(&Graph::new(3), &mut out).unwrap();
        assert_eq!(out, b"Source\tTarget\tweight\n".to_vec());
    }
}
