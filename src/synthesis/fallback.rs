//! Deterministic response synthesis used when no AI backend is available or
//! AI synthesis fails. Classification is an ordered rule list evaluated
//! top-to-bottom; the first matching rule wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    Batting,
    Bowling,
    Fielding,
    General,
}

struct Rule {
    category: QueryCategory,
    keywords: &'static [&'static str],
}

impl Rule {
    fn matches(&self, query: &str) -> bool {
        self.keywords.iter().any(|k| query.contains(k))
    }
}

// Precedence is the list order: batting terms are checked before bowling
// terms, bowling before fielding. Unmatched queries fall through to General.
const RULES: &[Rule] = &[
    Rule {
        category: QueryCategory::Batting,
        keywords: &["batting", "batsman", "batter", "run chase", "opening pair"],
    },
    Rule {
        category: QueryCategory::Bowling,
        keywords: &["bowling", "bowler", "yorker", "spinner", "seamer", "pace attack"],
    },
    Rule {
        category: QueryCategory::Fielding,
        keywords: &["fielding", "field placement", "slip cordon", "catching"],
    },
];

pub fn classify(query: &str) -> QueryCategory {
    let query = query.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&query))
        .map(|rule| rule.category)
        .unwrap_or(QueryCategory::General)
}

/// Render the template for a category, weaving in the acquired-data digest
/// when one exists.
pub fn render(category: QueryCategory, query: &str, data_digest: Option<&str>) -> String {
    let data_section = match data_digest {
        Some(digest) => format!("**Live Data Considered:**\n{}", digest),
        None => {
            "**Live Data Considered:**\nNo live data was available; recommendations draw on historical cricket trends.".to_string()
        }
    };

    match category {
        QueryCategory::Batting => format!(
            "Based on your batting query, here are the tactical recommendations:\n\
             \n\
             **Key Insights:**\n\
             - Set attacking fields for new batsmen, defensive fields once they are set\n\
             - Vary pace and length to disrupt the batsman's timing\n\
             - Position fielders on the batsman's dominant scoring arcs\n\
             \n\
             **Implementation:**\n\
             - Deploy two to three short balls per over through the middle overs\n\
             - Build pressure with dot balls to force a false stroke\n\
             \n\
             {}",
            data_section
        ),
        QueryCategory::Bowling => format!(
            "Here is the bowling analysis for your query:\n\
             \n\
             **Tactical Adjustments:**\n\
             - Attack the stumps to bring LBW and bowled into play\n\
             - Increase slower-ball usage in the death overs\n\
             - Use attacking placements against new batsmen\n\
             \n\
             **Phase Plan:**\n\
             - Powerplay: bowl full and straight with an occasional bouncer\n\
             - Middle overs: squeeze with dot balls, vary pace and length\n\
             - Death overs: mix yorkers with slower balls\n\
             \n\
             {}",
            data_section
        ),
        QueryCategory::Fielding => format!(
            "Here is the fielding plan for your query:\n\
             \n\
             **Placement Principles:**\n\
             - Match the field to the bowling plan, not the other way around\n\
             - Keep catching positions in while the ball is new\n\
             - Protect the boundaries square of the wicket once the batsman is set\n\
             \n\
             **Adjustments:**\n\
             - Bring the slip cordon up for seamers with the new ball\n\
             - Sweep positions deep for spinners against aggressive batsmen\n\
             \n\
             {}",
            data_section
        ),
        QueryCategory::General => format!(
            "Tactical analysis for your query: \"{}\"\n\
             \n\
             **Strategic Recommendations:**\n\
             - Optimize the batting order for the match situation and pitch\n\
             - Rotate bowlers every two to three overs to sustain pressure\n\
             - Adjust field settings to each batsman's scoring patterns\n\
             \n\
             **Phase Focus:**\n\
             - Powerplay: boundary hitting balanced against quick singles\n\
             - Middle overs: build partnerships while holding the run rate\n\
             - Death overs: maximize scoring with calculated risks\n\
             \n\
             {}",
            query, data_section
        ),
    }
}
