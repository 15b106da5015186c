//! Console reporter with colored output

use super::ScoredTranscript;
use crate::analyzer::engine::AggregateStats;
use crate::analyzer::scoring::ScoreCalculator;
use crate::{CriterionReport, Grade, Notice, ScoreReport, SignalStatus};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single scored transcript
    pub fn report(&self, scored: &ScoredTranscript) {
        print!("{}", self.render(scored));
    }

    /// Report multiple transcripts with summary
    pub fn report_many(&self, results: &[ScoredTranscript], stats: &AggregateStats) {
        for scored in results {
            self.report(scored);
            println!("{}", "─".repeat(60));
        }
        print!("{}", self.render_summary(stats));
    }

    /// Report in quiet mode (just score)
    pub fn report_quiet(&self, scored: &ScoredTranscript) {
        println!("{}", self.render_quiet(scored));
    }

    pub fn render_quiet(&self, scored: &ScoredTranscript) -> String {
        format!(
            "{}: {:.0} ({})",
            scored.source,
            scored.report.final_score,
            self.colorize_grade(scored.report.grade)
        )
    }

    pub fn render(&self, scored: &ScoredTranscript) -> String {
        let report = &scored.report;
        let mut out = String::new();
        self.write_header(&mut out, &scored.source, report);
        self.write_score(&mut out, report);
        self.write_criteria(&mut out, report);
        if !report.notices.is_empty() {
            self.write_notices(&mut out, &report.notices);
        }
        self.write_recommendations(&mut out, report);
        out.push('\n');
        out
    }

    pub fn render_summary(&self, stats: &AggregateStats) -> String {
        let mut out = String::new();
        let rule = "═".repeat(60);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{}", self.paint("Summary".bold()));
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "   Transcripts scored: {}",
            self.paint(stats.transcripts_scored.to_string().bold())
        );
        let _ = writeln!(
            out,
            "   Average score:      {} ({})",
            self.paint(format!("{:.1}", stats.average_score).bold()),
            self.colorize_grade(stats.average_grade)
        );
        let _ = writeln!(
            out,
            "   Range:              {:.1} - {:.1}",
            stats.min_score, stats.max_score
        );
        if stats.degraded > 0 {
            let _ = writeln!(out, "   Degraded reports:   {}", stats.degraded);
        }
        let _ = writeln!(out);
        out
    }

    fn write_header(&self, out: &mut String, source: &str, report: &ScoreReport) {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            self.paint(format!("🎤 Speech Evaluation: {}", source).bold())
        );
        let duration = report
            .duration_seconds
            .filter(|d| *d > 0.0)
            .map(|d| format!("{:.1}s", d))
            .unwrap_or_else(|| "not given".to_string());
        let _ = writeln!(
            out,
            "   Words: {} | Sentences: {} | Duration: {}",
            report.word_count, report.sentence_count, duration
        );
        let _ = writeln!(out);
    }

    fn write_score(&self, out: &mut String, report: &ScoreReport) {
        let grade = self.colorize_grade(report.grade);
        let bar = self.create_score_bar(report.final_score);
        let _ = writeln!(out, "   Score: {} {}", bar, grade);
        let _ = writeln!(
            out,
            "   {}",
            self.paint(ScoreCalculator::grade_description(report.grade).dimmed())
        );
        let _ = writeln!(out);
    }

    fn write_criteria(&self, out: &mut String, report: &ScoreReport) {
        let _ = writeln!(out, "   {}", self.paint("Score Breakdown:".bold()));
        for criterion in &report.criteria {
            self.write_criterion(out, criterion);
        }
        let _ = writeln!(out);
    }

    fn write_criterion(&self, out: &mut String, c: &CriterionReport) {
        if c.status == SignalStatus::Skipped {
            let _ = writeln!(
                out,
                "   {} {} {} ({})",
                self.create_mini_bar(0.0),
                self.paint(format!("{:>9}", "n/a").dimmed()),
                c.criterion,
                c.status
            );
        } else {
            let score = format!("{:>4.1}/{:<4}", c.sub_score, c.max_weight);
            let score = if c.fraction >= 0.8 {
                score.green()
            } else if c.fraction >= 0.6 {
                score.yellow()
            } else {
                score.red()
            };
            let degraded = if c.status == SignalStatus::Degraded {
                format!(" {}", self.paint("[degraded]".yellow()))
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "   {} {} {} (weight {}, contributes {:.1}){}",
                self.create_mini_bar(c.fraction),
                self.paint(score),
                c.criterion,
                format_weight(c),
                c.contribution,
                degraded
            );
        }

        let arrow = self.paint("→".dimmed());
        for signal in &c.signals {
            if self.verbose && c.signals.len() > 1 && signal.status != SignalStatus::Skipped {
                let _ = writeln!(
                    out,
                    "       {} {:.1}/{}",
                    self.paint(signal.signal.to_string().dimmed()),
                    signal.sub_score,
                    signal.max_score
                );
            }
            for line in &signal.feedback {
                let _ = writeln!(out, "       {} {}", arrow, line);
            }
            if self.verbose {
                if let Some(value) = signal.raw.value() {
                    let raw = format!("raw {}: {:.3}", signal.signal, value);
                    let _ = writeln!(out, "         {}", self.paint(raw.dimmed()));
                }
            }
        }
    }

    fn write_notices(&self, out: &mut String, notices: &[Notice]) {
        let _ = writeln!(out, "   {}", self.paint("Not fully evaluated:".bold()));
        for notice in notices {
            let icon = match notice.status {
                SignalStatus::Degraded => self.paint("⚠".yellow()),
                _ => self.paint("ℹ".blue()),
            };
            let _ = writeln!(
                out,
                "   {} [{}] {}: {}",
                icon,
                notice.signal,
                notice.status,
                notice.message
            );
        }
        let _ = writeln!(out);
    }

    fn write_recommendations(&self, out: &mut String, report: &ScoreReport) {
        if report.final_score < 90.0 {
            let _ = writeln!(out, "   {}", self.paint("Recommendations:".bold()));
            for rec in report.recommendations.iter().take(3) {
                let _ = writeln!(out, "   {} {}", self.paint("→".cyan()), rec);
            }
        }
    }

    fn paint(&self, s: ColoredString) -> String {
        if self.use_colors {
            s.to_string()
        } else {
            s.clear().to_string()
        }
    }

    fn colorize_grade(&self, grade: Grade) -> String {
        let s = grade.to_string();
        let colored = match grade {
            Grade::A => s.green().bold(),
            Grade::B => s.green(),
            Grade::C => s.yellow(),
            Grade::D => s.red(),
            Grade::F => s.red().bold(),
        };
        self.paint(colored)
    }

    fn create_score_bar(&self, score: f64) -> String {
        let filled = ((score.clamp(0.0, 100.0) * 20.0) / 100.0).round() as usize;
        let empty = 20 - filled;

        let bar = format!(
            "[{}{}] {:>3.0}%",
            "█".repeat(filled),
            "░".repeat(empty),
            score
        );

        if !self.use_colors {
            bar
        } else if score >= 80.0 {
            bar.green().to_string()
        } else if score >= 60.0 {
            bar.yellow().to_string()
        } else {
            bar.red().to_string()
        }
    }

    fn create_mini_bar(&self, fraction: f64) -> String {
        let filled = (fraction.clamp(0.0, 1.0) * 10.0).round() as usize;
        let empty = 10 - filled;
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(empty))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_weight(c: &CriterionReport) -> String {
    if (c.effective_weight - c.weight).abs() < 1e-9 {
        format!("{}", c.weight)
    } else {
        format!("{} → {:.1}", c.weight, c.effective_weight)
    }
}
