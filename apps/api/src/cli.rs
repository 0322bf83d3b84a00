use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::matching::engine::MatchReport;

#[derive(Parser)]
#[command(name = "resume-matcher")]
#[command(about = "Scores how well a resume matches a job description", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve,

    /// Match one resume against one job description
    Match {
        /// Resume file (.pdf or .txt)
        #[arg(short, long)]
        resume: PathBuf,

        /// Job description file (.pdf or .txt)
        #[arg(short, long)]
        job: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Human-readable report for the terminal.
pub fn render_report(report: &MatchReport) -> String {
    let result = &report.result;
    let breakdown = &report.breakdown;
    let mut out = String::new();

    let _ = writeln!(out, "Resume:          {}", result.resume);
    let _ = writeln!(out, "Job description: {}", result.job_description);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Skill overlap:  {:>6.2}%  (weight {:.2})",
        breakdown.skill_score, breakdown.weights.skills
    );
    let _ = writeln!(
        out,
        "  Semantic:       {:>6.2}%  (weight {:.2})",
        breakdown.semantic_score, breakdown.weights.semantic
    );
    let _ = writeln!(
        out,
        "  TF-IDF:         {:>6.2}%  (weight {:.2})",
        breakdown.tfidf_score, breakdown.weights.tfidf
    );
    let _ = writeln!(out, "Match score:     {:.2}%", result.match_score);
    let _ = writeln!(out);
    let _ = writeln!(out, "Skills matched:  {}", join_or_none(&result.skills_matched));
    let _ = writeln!(out, "Skills missing:  {}", join_or_none(&result.skills_missing));
    if !breakdown.candidate_skills.is_empty() {
        let _ = writeln!(
            out,
            "Other JD terms:  {}",
            breakdown.candidate_skills.join(", ")
        );
    }
    out
}

fn join_or_none(skills: &[String]) -> String {
    if skills.is_empty() {
        "(none)".to_string()
    } else {
        skills.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::engine::{MatchResult, MatchWeights, ScoreBreakdown};

    fn report(candidates: Vec<String>) -> MatchReport {
        MatchReport {
            result: MatchResult {
                resume: "resume.pdf".into(),
                job_description: "job.txt".into(),
                match_score: 65.0,
                skills_matched: vec!["docker".into(), "python".into()],
                skills_missing: vec![],
            },
            breakdown: ScoreBreakdown {
                skill_score: 50.0,
                semantic_score: 70.0,
                tfidf_score: 80.0,
                weights: MatchWeights::default(),
                candidate_skills: candidates,
            },
        }
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&report(vec![]));
        assert!(text.contains("Resume:          resume.pdf"));
        assert!(text.contains("Skill overlap:   50.00%  (weight 0.40)"));
        assert!(text.contains("Match score:     65.00%"));
        assert!(text.contains("Skills matched:  docker, python"));
        assert!(text.contains("Skills missing:  (none)"));
        assert!(!text.contains("Other JD terms"));
    }

    #[test]
    fn test_render_report_lists_candidates() {
        let text = render_report(&report(vec!["kubernetes".into()]));
        assert!(text.contains("Other JD terms:  kubernetes"));
    }

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "resume-matcher",
            "match",
            "--resume",
            "cv.pdf",
            "--job",
            "jd.txt",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Match { resume, job, json }) => {
                assert_eq!(resume, PathBuf::from("cv.pdf"));
                assert_eq!(job, PathBuf::from("jd.txt"));
                assert!(json);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["resume-matcher"]).unwrap();
        assert!(cli.command.is_none());
    }
}
