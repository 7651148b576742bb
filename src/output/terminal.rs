// Colored terminal output for cluster and topic summaries.
//
// This module handles all terminal-specific formatting: colors, bars and
// truncated example reviews. main.rs delegates here.

use colored::Colorize;

use crate::features::Vocabulary;
use crate::pipeline::AnalysisReport;
use crate::report::GroupSummary;
use crate::topics::TopicStructure;

/// Characters of each example review shown.
const EXAMPLE_CHARS: usize = 140;

/// Document-topic rows shown in the preview table.
const TOPIC_TABLE_ROWS: usize = 10;

/// Display the whole report: corpus stats, clusters, topics.
pub fn display_report(report: &AnalysisReport) {
    println!(
        "\n{}",
        format!(
            "=== {} reviews, {} terms ===",
            report.documents,
            report.vocabulary.len()
        )
        .bold()
    );
    let zero_rows = report.matrix.zero_rows();
    if zero_rows > 0 {
        println!(
            "  {}",
            format!("{zero_rows} reviews kept no vocabulary term").dimmed()
        );
    }

    display_group_summaries(
        &format!("Document clustering ({})", report.clusterer),
        "Cluster",
        &report.cluster_summaries,
        report.matrix.n_rows(),
    );
    println!(
        "  {}",
        format!(
            "inertia {:.3} after {} iterations{}",
            report.clusters.inertia,
            report.clusters.iterations,
            if report.clusters.converged { "" } else { " (iteration cap reached)" }
        )
        .dimmed()
    );

    display_group_summaries(
        &format!("Topic modeling ({})", report.topic_model),
        "Topic",
        &report.topic_summaries,
        report.matrix.n_rows(),
    );
    display_topic_table(&report.topics);
}

/// Display ranked keywords, a size bar and example reviews per group.
pub fn display_group_summaries(title: &str, label: &str, summaries: &[GroupSummary], total: usize) {
    println!("\n{}", format!("=== {title} ===").bold());
    println!();

    let bar_width: usize = 20;

    for summary in summaries {
        let share = if total > 0 {
            summary.size as f64 / total as f64
        } else {
            0.0
        };
        let filled = (share * bar_width as f64).round() as usize;
        let empty = bar_width.saturating_sub(filled);
        let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));

        let colored_bar = if share >= 0.25 {
            bar.bright_green()
        } else if share >= 0.10 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!(
            "  {} {:<3} {} {} reviews",
            label.bold(),
            summary.index,
            colored_bar,
            summary.size
        );
        println!("      Keywords: {}", summary.keyword_terms().join(", ").dimmed());

        for (i, example) in summary.examples.iter().enumerate() {
            let preview = super::truncate_chars(example, EXAMPLE_CHARS);
            println!("      Example{}: {}", i + 1, preview.dimmed());
        }
        println!();
    }
}

/// Display the first rows of the document-topic matrix, rounded to two places.
pub fn display_topic_table(topics: &TopicStructure) {
    let rows = topics.rounded_rows(2, TOPIC_TABLE_ROWS);
    if rows.is_empty() {
        return;
    }

    let header: String = (0..topics.n_topics()).map(|t| format!("{:>8}", format!("Topic{t}"))).collect();
    println!("  {:<6}{}  {}", "", header.dimmed(), "topic".dimmed());
    for (doc, row) in rows.iter().enumerate() {
        let cells: String = row.iter().map(|p| format!("{p:>8.2}")).collect();
        println!("  {:<6}{}  {:>5}", format!("Doc{doc}"), cells, topics.dominant[doc]);
    }
    println!();
}

/// Display vocabulary size and an evenly spaced sample of terms.
pub fn display_vocabulary(vocabulary: &Vocabulary, documents: usize) {
    println!(
        "\n{}",
        format!(
            "=== In total, there are {documents} reviews and {} terms ===",
            vocabulary.len()
        )
        .bold()
    );
    println!("  Sample: {}", vocabulary.sample(5, 100).join(", ").dimmed());
}

/// Display the stem sequence for one text.
pub fn display_stems(text: &str, stems: &[String]) {
    println!("  {}", super::truncate_chars(text, EXAMPLE_CHARS).dimmed());
    if stems.is_empty() {
        println!("  (no stems after filtering)");
    } else {
        println!("  {}", stems.join(" ").bold());
    }
}
