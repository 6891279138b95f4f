//! Console output formatter for debate sessions and results

use colored::Colorize;
use debate_domain::{
    Argument, ConnectionState, DebateSession, Metric, NormalizedScore, OpenDebate, Outcome,
    OutputFormat, Results, ResultsSource, RoomState, Side, normalize,
};

/// Formats sessions, rooms and results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    // ==================== Results ====================

    /// Format results in the requested format
    pub fn format_results(results: &Results, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format_results_full(results),
            OutputFormat::Summary => Self::format_results_summary(results),
            OutputFormat::Json => Self::format_json(results),
        }
    }

    /// Full results: winner, totals and the per-metric breakdown
    pub fn format_results_full(results: &Results) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Debate Results"));
        output.push('\n');
        output.push_str(&Self::outcome_line(results));
        output.push('\n');

        output.push_str(&Self::section_header("Totals"));
        for side in Side::ALL {
            output.push_str(&format!(
                "  {} {:>6.1}\n",
                format!("{} ({}):", results.side_name(side), side).yellow().bold(),
                results.total(side)
            ));
        }
        if let Some(coherence) = &results.coherence {
            let rating = coherence
                .rating
                .as_deref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {} {:.2}{}\n",
                "Coherence:".dimmed(),
                coherence.score,
                rating
            ));
        }

        if !results.breakdown.is_empty() {
            output.push_str(&Self::section_header("Breakdown"));
            output.push_str(&format!(
                "  {:<22} {:>8} {:>8}\n",
                "Metric".dimmed(),
                "A".dimmed(),
                "B".dimmed()
            ));
            for metric in Metric::ALL {
                let a = results.scaled_sub_score(Side::A, metric);
                let b = results.scaled_sub_score(Side::B, metric);
                if a.is_none() && b.is_none() {
                    continue;
                }
                output.push_str(&format!(
                    "  {:<22} {:>8} {:>8}\n",
                    metric.label(),
                    Self::optional_score(a),
                    Self::optional_score(b)
                ));
            }
        }

        if results.source == ResultsSource::Local {
            output.push_str(&format!(
                "\n{}\n",
                "Computed locally from the arguments received.".dimmed()
            ));
        }
        if results.unassigned_arguments > 0 {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "{} argument(s) had no side and were not counted.",
                    results.unassigned_arguments
                )
                .yellow()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Winner and totals on two lines
    pub fn format_results_summary(results: &Results) -> String {
        format!(
            "{}\n{} A {:.1} / B {:.1}\n",
            Self::outcome_line(results),
            "Totals:".dimmed(),
            results.total(Side::A),
            results.total(Side::B)
        )
    }

    /// Format any serializable value as JSON
    pub fn format_json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn outcome_line(results: &Results) -> String {
        match results.outcome {
            Outcome::Winner(side) => format!(
                "{} {}",
                "Winner:".cyan().bold(),
                format!("{} (Side {})", results.side_name(side), side).green().bold()
            ),
            Outcome::Draw => format!("{} {}", "Outcome:".cyan().bold(), "Draw".yellow().bold()),
        }
    }

    fn optional_score(score: Option<f64>) -> String {
        score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string())
    }

    // ==================== Sessions ====================

    /// Format one session
    pub fn format_session(session: &DebateSession, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::format_json(session);
        }

        let mut output = String::new();
        output.push_str(&format!("{} {}\n", "Topic:".cyan().bold(), session.topic));
        output.push_str(&format!("{} {}\n", "Id:".cyan().bold(), session.id));
        if format == OutputFormat::Full && !session.description.is_empty() {
            output.push_str(&format!("{}\n", Self::indent(&session.description, "  ")));
        }
        if let Some(code) = session.visibility.invite_code() {
            output.push_str(&format!("{} {}\n", "Invite code:".cyan().bold(), code.bold()));
        }
        output.push_str(&format!(
            "{} {} min\n",
            "Duration:".cyan().bold(),
            session.duration_minutes
        ));
        for side in Side::ALL {
            let seat = match session.participant_on(side) {
                Some(p) => p.display_name.clone(),
                None => "(open)".dimmed().to_string(),
            };
            output.push_str(&format!("  {} {}\n", format!("Side {}:", side).yellow(), seat));
        }
        if session.finalized {
            output.push_str(&format!("{}\n", "Finalized".green().bold()));
        }
        output
    }

    /// Format the open-debates lobby
    pub fn format_open_debates(debates: &[OpenDebate], format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::format_json(&debates);
        }
        if debates.is_empty() {
            return format!("{}\n", "No open debates.".dimmed());
        }

        let mut output = Self::section_header(&format!("Open debates ({})", debates.len()));
        for debate in debates {
            output.push_str(&format!(
                "  {}  {}  {}\n",
                debate.session.id.to_string().yellow(),
                debate.session.topic.bold(),
                format!(
                    "[{} min, {} seat(s) left]",
                    debate.session.duration_minutes,
                    debate.seats_left()
                )
                .dimmed()
            ));
            if format == OutputFormat::Full && !debate.session.description.is_empty() {
                output.push_str(&format!("      {}\n", debate.session.description));
            }
        }
        output
    }

    // ==================== Room ====================

    /// Banner printed when entering a room
    pub fn format_room(state: &RoomState) -> String {
        let mut output = String::new();
        let title = state
            .session
            .as_ref()
            .map(|s| s.topic.as_str())
            .unwrap_or("Debate room");
        output.push_str(&Self::header(title));
        output.push('\n');
        if let Some(session) = &state.session {
            for side in Side::ALL {
                if let Some(p) = session.participant_on(side) {
                    output.push_str(&format!(
                        "  {} {}{}\n",
                        format!("Side {}:", side).yellow().bold(),
                        p.display_name,
                        Self::presence_suffix(p.connection_state)
                    ));
                }
            }
        }
        output.push_str(&format!(
            "{} {}  {} {}\n",
            "Phase:".dimmed(),
            state.phase,
            "Arguments:".dimmed(),
            state.argument_count()
        ));
        for argument in state.arguments() {
            output.push_str(&Self::format_argument(argument, state.session.as_ref()));
            output.push('\n');
        }
        output
    }

    /// One argument line: `[A] alice (72.50): content`
    pub fn format_argument(argument: &Argument, session: Option<&DebateSession>) -> String {
        let side = session.and_then(|s| s.side_of(&argument.author_id));
        let tag = match side {
            Some(Side::A) => "[A]".blue().bold(),
            Some(Side::B) => "[B]".magenta().bold(),
            None => "[?]".dimmed(),
        };
        let author = argument
            .author_name
            .clone()
            .or_else(|| {
                session
                    .and_then(|s| s.participant(&argument.author_id))
                    .map(|p| p.display_name.clone())
            })
            .unwrap_or_else(|| argument.author_id.to_string());
        let score = if argument.is_score_pending() {
            "scoring...".dimmed().to_string()
        } else {
            normalize(&argument.raw_score).display_value().green().to_string()
        };
        format!("{} {} ({}): {}", tag, author.bold(), score, argument.content)
    }

    /// Format a normalized score payload
    pub fn format_normalized(score: &NormalizedScore, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::format_json(score);
        }
        let mut output = format!(
            "{} {} {}\n",
            "Score:".cyan().bold(),
            score.display_value().bold(),
            format!("({})", score.source_kind).dimmed()
        );
        if format == OutputFormat::Full {
            for (name, value) in &score.metrics {
                output.push_str(&format!("  {:<16} {}\n", name, value));
            }
        }
        output
    }

    fn presence_suffix(state: ConnectionState) -> String {
        match state {
            ConnectionState::Connected => String::new(),
            ConnectionState::Disconnected => format!(" {}", "(away)".dimmed()),
        }
    }

    // ==================== Layout ====================

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use debate_domain::{ParticipantRecord, RawScore, ResultsAggregator, TieBreak};
    use std::collections::BTreeMap;

    fn session() -> DebateSession {
        let mut session = DebateSession::new("d1", "AI vs Humans");
        session.seat(ParticipantRecord::new("u1").with_display_name("alice"));
        session.seat(ParticipantRecord::new("u2").with_display_name("bob"));
        session
    }

    fn argument(id: &str, author: &str, score: RawScore) -> Argument {
        Argument::new(
            id,
            "d1",
            author,
            "Machines augment us",
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        )
        .with_score(score)
    }

    fn draw_results() -> Results {
        let metrics = RawScore::metrics([
            ("clarity", 0.9),
            ("sentiment", 0.5),
            ("vocab_richness", 0.7),
            ("avg_word_len", 5.0),
            ("length", 800.0),
        ]);
        ResultsAggregator::new(TieBreak::Draw).aggregate(
            &session(),
            &[
                argument("a1", "u1", metrics.clone()),
                argument("a2", "u2", metrics),
            ],
        )
    }

    #[test]
    fn test_full_results_list_totals_and_metrics() {
        let output = ConsoleFormatter::format_results(&draw_results(), OutputFormat::Full);
        assert!(output.contains("Draw"));
        assert!(output.contains("77.0"));
        assert!(output.contains("Vocabulary Richness"));
        assert!(output.contains("Computed locally"));
    }

    #[test]
    fn test_full_results_show_names_and_scaled_breakdown() {
        let results: Results = serde_json::from_value(serde_json::json!({
            "winner": "A",
            "users": {"A": {"username": "alice"}, "B": {"email": "bob@example.com"}},
            "totals": {"A": 70, "B": 60},
            "scores": {"A": {"clarity": {"score": 0.7, "rating": "good"}}},
            "coherence": {"score": 0.82, "rating": "good"}
        }))
        .unwrap();
        let output = ConsoleFormatter::format_results(&results, OutputFormat::Full);
        assert!(output.contains("alice (Side A)"));
        assert!(output.contains("bob@example.com (B):"));
        assert!(output.contains("70.0"));
        assert!(output.contains("Coherence:"));
        assert!(output.contains("0.82 (good)"));
    }

    #[test]
    fn test_local_results_use_participant_names() {
        let output = ConsoleFormatter::format_results(&draw_results(), OutputFormat::Full);
        assert!(output.contains("alice (A):"));
        assert!(output.contains("bob (B):"));
        assert!(output.contains("90.0"));
    }

    #[test]
    fn test_summary_results() {
        let output = ConsoleFormatter::format_results(&draw_results(), OutputFormat::Summary);
        assert!(output.contains("A 77.0 / B 77.0"));
        assert!(!output.contains("Breakdown"));
    }

    #[test]
    fn test_json_results_parse_back() {
        let output = ConsoleFormatter::format_results(&draw_results(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_argument_line_shows_side_and_normalized_score() {
        let session = session();
        let line = ConsoleFormatter::format_argument(
            &argument("a1", "u2", RawScore::metrics([("clarity", 0.8), ("sentiment", 0.6)])),
            Some(&session),
        );
        assert!(line.contains("[B]"));
        assert!(line.contains("bob"));
        assert!(line.contains("0.70"));
        assert!(line.contains("Machines augment us"));
    }

    #[test]
    fn test_argument_line_pending_score() {
        let line =
            ConsoleFormatter::format_argument(&argument("a1", "u9", RawScore::Unknown), None);
        assert!(line.contains("[?]"));
        assert!(line.contains("u9"));
        assert!(line.contains("scoring..."));
    }

    #[test]
    fn test_open_debates_empty_and_listed() {
        assert!(ConsoleFormatter::format_open_debates(&[], OutputFormat::Full).contains("No open"));

        let open = OpenDebate {
            session: DebateSession::new("d7", "Remote work is better"),
            max_users: 2,
        };
        let output = ConsoleFormatter::format_open_debates(&[open], OutputFormat::Summary);
        assert!(output.contains("d7"));
        assert!(output.contains("Remote work is better"));
        assert!(output.contains("2 seat(s) left"));
    }

    #[test]
    fn test_session_shows_invite_code() {
        let mut session = session();
        session.visibility = debate_domain::Visibility::Private {
            invite_code: "QX7P".to_string(),
        };
        let output = ConsoleFormatter::format_session(&session, OutputFormat::Full);
        assert!(output.contains("QX7P"));
        assert!(output.contains("alice"));
    }

    #[test]
    fn test_normalized_full_lists_metrics() {
        let score = NormalizedScore {
            canonical_value: 0.7,
            metrics: BTreeMap::from([("clarity".to_string(), 0.8), ("sentiment".to_string(), 0.6)]),
            source_kind: debate_domain::SourceKind::MultiMetric,
        };
        let output = ConsoleFormatter::format_normalized(&score, OutputFormat::Full);
        assert!(output.contains("0.70"));
        assert!(output.contains("clarity"));
        let summary = ConsoleFormatter::format_normalized(&score, OutputFormat::Summary);
        assert!(!summary.contains("clarity"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
