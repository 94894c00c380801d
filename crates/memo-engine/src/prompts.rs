//! Prompt templates for report synthesis

/// Fill the five-section memo prompt with the serialized stage outputs
pub fn report_prompt(ticker: &str, data_summary: &str, news_summary: &str) -> String {
    format!(
        r"Synthesize a professional equity analysis memo for {ticker} using the provided data.

Structure your analysis as follows:
- **Company Overview**: Sector, market cap, beta from the data
- **Technical Signals**: 30-day and 120-day trends, max drawdown over ~12 months, valuation note (PE ratios)
- **Key Risks**: Top 3 specific risks based on the data and news
- **Catalysts & Monitors**: 3 things to watch based on recent developments
- **Investment Stance**: One clear line recommendation

Be concise, concrete, and focus on actionable insights. Output in Markdown format.

Stock Data:
{data_summary}

Recent News:
{news_summary}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_all_sections() {
        let prompt = report_prompt("AAPL", "{}", "[]");
        assert!(prompt.contains("AAPL"));
        for section in [
            "Company Overview",
            "Technical Signals",
            "Key Risks",
            "Catalysts & Monitors",
            "Investment Stance",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }
}
