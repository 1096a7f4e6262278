//! Canned "AI" text blocks.
//!
//! Nothing here analyses anything: every report is a fixed template filled
//! with the record's own values, handed back after an artificial delay so the
//! frontend keeps its loading state.

use std::time::Duration;

use crate::record::Record;

pub trait RecordTemplate: Send + Sync {
    fn render(&self, record: &Record) -> String;
}

pub trait InsightsTemplate: Send + Sync {
    fn render(&self, records: &[&Record]) -> String;
}

/// Delivers rendered text after a fixed delay. A zero delay renders
/// immediately.
#[derive(Debug, Clone, Copy)]
pub struct ReportGenerator {
    delay: Duration,
}

impl ReportGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn generate<F>(&self, render: F) -> String
    where
        F: FnOnce() -> String,
    {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        render()
    }
}

/// Per-person summary shown on the data row detail screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSummary;

impl RecordTemplate for ProfileSummary {
    fn render(&self, record: &Record) -> String {
        let name = record.display("name");
        let pet_sentence = if record.flag("has_pet") {
            "They are a pet owner, which suggests a nurturing personality and responsibility."
        } else {
            "They do not currently have pets."
        };

        format!(
            "Professional summary for {name}:\n\n\
             {name} is a {age}-year-old {job} based in {city}. {description} {pet_sentence} \n\n\
             This individual demonstrates strong professional capabilities in their field and \
             appears well-established in their career. Their background suggests they would be a \
             valuable addition to any team requiring expertise in their domain.",
            age = record.display("age"),
            job = record.display("job").to_lowercase(),
            city = record.display("city"),
            description = record.display("description"),
        )
    }
}

/// Evaluation report shown on the application detail screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationEvaluation;

impl RecordTemplate for ApplicationEvaluation {
    fn render(&self, record: &Record) -> String {
        let brand = record.display("brand_name");
        let eligible = record.display("eligibility") == "Eligible";
        let team_members = record.number("team_size").unwrap_or(0.0);
        let business_model = record.display("business_model");
        let funding_stage = record.display("funding_stage");

        let team_size_text = if team_members > 0.0 {
            record.display("team_size")
        } else {
            "Not specified".to_string()
        };
        let team_capability = if team_members > 5.0 { "Strong" } else { "Developing" };
        let model_scalability = if business_model.contains("SaaS") {
            "Scalable"
        } else {
            "Traditional"
        };
        let recommendation = if eligible {
            "RECOMMENDED FOR INCUBATION - Strong potential for growth and market impact."
        } else {
            "NEEDS IMPROVEMENT - Requires further development before admission."
        };
        let funding_risk = if funding_stage == "Bootstrap" { "High" } else { "Low" };
        let next_steps = if eligible {
            "Schedule interview and due diligence"
        } else {
            "Provide feedback and encourage reapplication"
        };

        format!(
            "TIDE 2.0 Application Evaluation for {brand}\n\n\
             📋 APPLICATION OVERVIEW:\n\
             Applicant: {applicant}\n\
             Company: {brand}\n\
             Current Status: {status}\n\n\
             🏢 BUSINESS ANALYSIS:\n\
             Business Model: {model}\n\
             Target Market: {market}\n\
             Team Size: {team_size_text} members\n\
             Funding Stage: {stage}\n\n\
             📝 DETAILED ASSESSMENT:\n\
             {description}\n\n\
             💡 EVALUATION CRITERIA:\n\
             ✓ Innovation Potential: High - Demonstrates novel approach\n\
             ✓ Market Opportunity: Strong - Clear target market identified\n\
             ✓ Team Capability: {team_capability} - {team_size} member team\n\
             ✓ Business Model: {model_scalability} - {business_model}\n\n\
             🎯 RECOMMENDATION:\n\
             {recommendation}\n\n\
             📊 RISK ASSESSMENT:\n\
             - Market Risk: Medium\n\
             - Technical Risk: Low\n\
             - Execution Risk: Medium\n\
             - Funding Risk: {funding_risk}\n\n\
             Next Steps: {next_steps}",
            applicant = record.display("applicant_name"),
            status = record.display("eligibility"),
            model = or_not_specified(&business_model),
            market = or_not_specified(&record.display("target_market")),
            stage = or_not_specified(&funding_stage),
            description = or_default(&record.display("description"), "No description provided"),
            team_size = record.display("team_size"),
        )
    }
}

/// Aggregate view over the filtered data rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataInsights;

impl InsightsTemplate for DataInsights {
    fn render(&self, records: &[&Record]) -> String {
        let count = records.len();
        let average_age = rounded_average(records.iter().map(|record| record.number("age")), count);
        let cities = first_seen(records.iter().map(|record| record.display("city")));
        let pet_owners = records.iter().filter(|record| record.flag("has_pet")).count();
        let most_common_job = tally(records.iter().map(|record| record.display("job")))
            .into_iter()
            .fold(None::<(String, usize)>, |best, (job, hits)| match best {
                Some((_, best_hits)) if best_hits >= hits => best,
                _ => Some((job, hits)),
            })
            .map(|(job, _)| job)
            .filter(|job| !job.is_empty())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "Based on the filtered data analysis:\n\n\
             • {count} records analyzed\n\
             • Average age: {average_age}\n\
             • Cities represented: {cities}\n\
             • Pet owners: {pet_owners}/{count}\n\
             • Most common job: {most_common_job}\n\n\
             Key patterns identified:\n\
             - Professional diversity across multiple industries\n\
             - Geographic distribution spanning major US cities\n\
             - Mixed demographic characteristics suggesting broad representation",
            cities = cities.join(", "),
        )
    }
}

/// Aggregate view over the filtered applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationInsights;

impl InsightsTemplate for ApplicationInsights {
    fn render(&self, records: &[&Record]) -> String {
        let total = records.len();
        let eligible = records
            .iter()
            .filter(|record| record.display("eligibility") == "Eligible")
            .count();
        let eligible_percent = if total == 0 {
            0
        } else {
            ((eligible as f64 / total as f64) * 100.0).round() as i64
        };
        let average_team = rounded_average(
            records
                .iter()
                .map(|record| Some(record.number("team_size").unwrap_or(0.0))),
            total,
        );

        let models = tally(
            records
                .iter()
                .map(|record| record.display("business_model"))
                .filter(|value| !value.is_empty()),
        );
        let markets = tally(
            records
                .iter()
                .map(|record| record.display("target_market"))
                .filter(|value| !value.is_empty()),
        );

        let model_lines = models
            .iter()
            .map(|(model, hits)| format!("• {model}: {hits} applications"))
            .collect::<Vec<_>>()
            .join("\n");
        let market_lines = markets
            .iter()
            .take(5)
            .map(|(market, hits)| format!("• {market}: {hits} startups"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "TIDE 2.0 Program Application Analysis:\n\n\
             📊 APPLICATION METRICS:\n\
             • Total Applications Analyzed: {total}\n\
             • Eligible Applications: {eligible} ({eligible_percent}%)\n\
             • Not Eligible: {not_eligible}\n\
             • Average Team Size: {average_team} members\n\n\
             🏢 BUSINESS MODEL DISTRIBUTION:\n\
             {model_lines}\n\n\
             🎯 TARGET MARKET ANALYSIS:\n\
             {market_lines}\n\n\
             💡 KEY INSIGHTS:\n\
             - Strong representation in AI/Tech sector with F-AI leading in innovation\n\
             - Diverse funding stages from Bootstrap to Series A\n\
             - High potential in B2B SaaS and platform-based business models\n\
             - Emerging opportunities in healthcare technology and automation\n\
             - Mixed eligibility suggests need for better pre-screening criteria\n\n\
             🔍 RECOMMENDATIONS:\n\
             - Focus mentorship on eligible startups with proven traction\n\
             - Consider creating specialized tracks for different business models\n\
             - Evaluate team composition and technical expertise more thoroughly",
            not_eligible = total - eligible,
        )
    }
}

fn or_not_specified(value: &str) -> &str {
    or_default(value, "Not specified")
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn rounded_average<I>(values: I, count: usize) -> i64
where
    I: Iterator<Item = Option<f64>>,
{
    if count == 0 {
        return 0;
    }
    let sum: f64 = values.flatten().sum();
    (sum / count as f64).round() as i64
}

fn first_seen<I>(values: I) -> Vec<String>
where
    I: Iterator<Item = String>,
{
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Occurrence counts in first-seen order.
fn tally<I>(values: I) -> Vec<(String, usize)>
where
    I: Iterator<Item = String>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, hits)) => *hits += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> Record {
        Record::new("1")
            .with("name", "John Doe")
            .with("age", 32i64)
            .with("city", "New York")
            .with("has_pet", true)
            .with("job", "Engineer")
            .with(
                "description",
                "John is a highly skilled engineer who recently moved to the city.",
            )
    }

    fn application(brand: &str, eligibility: &str, model: &str, team: i64) -> Record {
        Record::new(brand)
            .with("brand_name", brand)
            .with("applicant_name", "Founder")
            .with("eligibility", eligibility)
            .with("business_model", model)
            .with("target_market", "Healthcare Providers")
            .with("funding_stage", "Seed")
            .with("description", "")
            .with("team_size", team)
    }

    #[test]
    fn profile_summary_renders_the_full_block() {
        let expected = "Professional summary for John Doe:\n\n\
            John Doe is a 32-year-old engineer based in New York. John is a highly skilled \
            engineer who recently moved to the city. They are a pet owner, which suggests a \
            nurturing personality and responsibility. \n\n\
            This individual demonstrates strong professional capabilities in their field and \
            appears well-established in their career. Their background suggests they would be a \
            valuable addition to any team requiring expertise in their domain.";

        assert_eq!(ProfileSummary.render(&john()), expected);
    }

    #[test]
    fn evaluation_renders_the_full_block() {
        let expected = "TIDE 2.0 Application Evaluation for MediCore AI\n\
            \n\
            📋 APPLICATION OVERVIEW:\n\
            Applicant: Founder\n\
            Company: MediCore AI\n\
            Current Status: Eligible\n\
            \n\
            🏢 BUSINESS ANALYSIS:\n\
            Business Model: B2B SaaS\n\
            Target Market: Healthcare Providers\n\
            Team Size: 15 members\n\
            Funding Stage: Seed\n\
            \n\
            📝 DETAILED ASSESSMENT:\n\
            No description provided\n\
            \n\
            💡 EVALUATION CRITERIA:\n\
            ✓ Innovation Potential: High - Demonstrates novel approach\n\
            ✓ Market Opportunity: Strong - Clear target market identified\n\
            ✓ Team Capability: Strong - 15 member team\n\
            ✓ Business Model: Scalable - B2B SaaS\n\
            \n\
            🎯 RECOMMENDATION:\n\
            RECOMMENDED FOR INCUBATION - Strong potential for growth and market impact.\n\
            \n\
            📊 RISK ASSESSMENT:\n\
            - Market Risk: Medium\n\
            - Technical Risk: Low\n\
            - Execution Risk: Medium\n\
            - Funding Risk: Low\n\
            \n\
            Next Steps: Schedule interview and due diligence";

        let text = ApplicationEvaluation.render(&application("MediCore AI", "Eligible", "B2B SaaS", 15));
        assert_eq!(text, expected);
    }

    #[test]
    fn evaluation_without_team_or_eligibility() {
        let text = ApplicationEvaluation.render(&application("Sravanthi", "Not Eligible", "Service Based", 0));
        assert!(text.contains("Team Size: Not specified members"));
        assert!(text.contains("✓ Team Capability: Developing - 0 member team"));
        assert!(text.contains("✓ Business Model: Traditional - Service Based"));
        assert!(text.contains("NEEDS IMPROVEMENT"));
        assert!(text.ends_with("Next Steps: Provide feedback and encourage reapplication"));
    }

    #[test]
    fn data_insights_aggregate_the_rows() {
        let jane = Record::new("2")
            .with("age", 28i64)
            .with("city", "Los Angeles")
            .with("has_pet", false)
            .with("job", "Designer");
        let peter = Record::new("3")
            .with("age", 45i64)
            .with("city", "New York")
            .with("has_pet", true)
            .with("job", "Designer");
        let john = john();
        let text = DataInsights.render(&[&john, &jane, &peter]);

        assert!(text.contains("• 3 records analyzed"));
        assert!(text.contains("• Average age: 35"));
        assert!(text.contains("• Cities represented: New York, Los Angeles"));
        assert!(text.contains("• Pet owners: 2/3"));
        assert!(text.contains("• Most common job: Designer"));
    }

    #[test]
    fn most_common_job_prefers_the_first_seen_on_ties() {
        let a = Record::new("a").with("job", "Manager");
        let b = Record::new("b").with("job", "Engineer");
        let text = DataInsights.render(&[&a, &b]);
        assert!(text.contains("• Most common job: Manager"));
    }

    #[test]
    fn blank_most_common_job_reads_not_available() {
        let a = Record::new("a").with("job", "");
        let b = Record::new("b").with("job", "");
        let c = Record::new("c").with("job", "Chef");
        let text = DataInsights.render(&[&a, &b, &c]);
        assert!(text.contains("• Most common job: N/A"));
    }

    #[test]
    fn application_insights_count_eligibility() {
        let a = application("A", "Eligible", "B2B SaaS", 15);
        let b = application("B", "Not Eligible", "B2B SaaS", 3);
        let c = application("C", "Eligible", "Service Based", 8);
        let text = ApplicationInsights.render(&[&a, &b, &c]);

        assert!(text.contains("• Total Applications Analyzed: 3"));
        assert!(text.contains("• Eligible Applications: 2 (67%)"));
        assert!(text.contains("• Not Eligible: 1"));
        assert!(text.contains("• Average Team Size: 9 members"));
        assert!(text.contains("• B2B SaaS: 2 applications\n• Service Based: 1 applications"));
        assert!(text.contains("• Healthcare Providers: 3 startups"));
    }

    #[tokio::test]
    async fn zero_delay_renders_immediately() {
        let generator = ReportGenerator::immediate();
        let text = generator.generate(|| ProfileSummary.render(&john())).await;
        assert_eq!(text, ProfileSummary.render(&john()));
    }

    #[tokio::test]
    async fn delayed_generation_waits_before_rendering() {
        let generator = ReportGenerator::new(Duration::from_millis(20));
        let started = std::time::Instant::now();
        let text = generator.generate(|| "done".to_string()).await;
        assert_eq!(text, "done");
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
