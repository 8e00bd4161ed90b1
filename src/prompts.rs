//! Prompt contracts for the extraction and validation passes.
//!
//! These strings define what counts as a prediction. They are sent to the
//! model as-is; no part of the classification is re-implemented in code.

use crate::models::PredictionRecord;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a prediction extraction assistant. You extract concrete predictions authors made about the future from blog posts, if there are any.";

/// Instruction block placed in front of the archive text.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"
Extract any predictions about the future that the authors (not quotes of other people or articles) made using their own judgement or opinions in the content pasted below.
For each prediction, provide:
1. Paraphrased prediction text, like 'There will not be a recession in H1 2019
2. The exact quote containing the prediction
3. Referenced datetime lower bound (when the prediction might start being relevant)
4. Referenced datetime upper bound (when the prediction might end being relevant)

If dates are not explicitly mentioned, infer them from context or mark as "unspecified".
Only include genuine predictions about future outcomes, not hypotheticals or opinions.

Format the output as a JSON object like this:
{
    "predictions": [
        {
            "paraphrased_prediction": "...",
            "exact_quote": "...",
            "datetime_lower_bound": "..." (YYYY-MM-DD or "unspecified"),
            "datetime_upper_bound": "..." (YYYY-MM-DD or "unspecified"),
        },
        ...
    ]
}

If no concrete predictions are found, return an empty array. Many texts won't have any predictions, which is expected, just return an empty array in that case.

Only include predictions made by post authors, not quotes from other people, subject matter experts, articles, papers, or any source other than the author of the top level post. Never include predictions made in markdown block quotes with `> `.

Only include predictions of a specific time, such as 'next year' or 'in 2025', and do not include predictions without a given time such as 'nvidia will go up' if there's no context clarifying the time frame. 

Do not include statements about official future plans, such as 'the 2030 olympics will be held in ...' or 'the tariffs will go into effect in 2025', only the author's opinion or judgement about the future.

Here are some example texts:
<example>
    s, as of now, the FDA is moving in the wrong direction and Makary has lost an ally against RFK.

In other news, the firing of FDA staff is [slowing down approvals](https://www.reuters.com/business/healthcare-pharmaceuticals/fda-staff-struggle-meet-product-review-deadlines-after-doge-layoffs-2025-03-27/), as [I predicted it would](https://marginalrevolution.com/marginalrevolution/2025/02/hire-dont-fire-at-the-fda.html).

> Mexico's economy is slowing sharply and will soon fall into recession, several economists predict, as Donald Trump's changing tariff plans cast uncertainty over the relationship with its largest trading partner.
> 
> Mexico is one of the countries most vulnerable to the US president's drive to reshore investment and close trade deficits. The country's economy was already fragile, with the government cutting spending due to a gaping budget deficit and investors spooked by its radical judicial reforms.
> 
> Mexico's GDP shrank 0.6 per cent in the fourth quarter of last year from the previous three months, while economic activity fell 0.2 per cent in January.
> 
> The central bank cut its key interest rate by 50 basis points on Thursday, warning that the economy would show weakness in the first quarter and that trade tensions posed "significant downward risks".

Here is [more from the FT](https://www.ft.com/content/e8488ad0-212e-445d-813a-eec2b6750216).
<end_example>
The above example should return an empty array, because all predictions in the text are in block quotes.
<example>
I think that the FDA's excellent arguments for conditional approval apply to human drugs as well as to (other) animal drugs and even more so when we recognize that human beings have rights and interests in making their own choices. The Promising Pathways Act would create something like conditional approval (the act calls it provisional approval) for drugs treating human diseases that are life-threatening so there is some hope that conditional approval for human drugs becomes a reality.
<end_example>
The above example should return an empty array, because it only says 'there is hope'. Expressing hope is not a prediction.
<example>
In other news, the firing of FDA staff is slowing down approvals, as I predicted it would.
<end_example>
The above example should return an empty array, because it mentions a previous prediction, and does not make a prediction about the *future* relative to the time of writing.
<example>
Monthly inflation in Argentina could fall below 10% in April, a sign that the government's policies are working, President Javier Milei said Sunday in a phone interview with LN+
<end_example>
The above example should return an empty array, because it says monthly inflation *could* fall in april, instead of saying it *will* fall in april, and it's a quote by Javier Milei, not the author.
<example>
the CMS issued new benchmarks that will allow the agency to weed out poor performers beginning in 2026.
<end_example>
The above example should return an empty array, because it's a statement of the agency's plan, not a prediction.
<example>
This prediction is from Manifold Markets. Metaculus gives similar odds to a similar question. These are serious predictions.

In a 2019 post I pointed out that expert surveys (not markets) suggested the annualized probability of a nuclear war was on the order of  ~1%–and I thought that was worryingly high. We are now at ten times that level. This is very, very bad.
<end_example>
The above example should return an empty array, because it's a prediction from Manifold Markets or Metaculus, not the author.
<example>
[posted January 29, 2021]
The contentiousness is much worse in Europe, where zero- and negative-sum thinking is the order of the day.  That is the theme of my latest Bloomberg column, here is one bit:

> In most of Europe, it’s hard to see much good news. It’s one thing not to have a vaccine. It’s far worse to turn on television or go on the internet and see people in other countries being vaccinated as their pandemics recede. Most of Europe will not be making significant vaccination progress until April, and even then shortages may remain.

> At stake is the very legitimacy of the EU. Most of the vaccination contracts were handled at the EU level, although Germany sidestepped the agreed-upon procedures and cut some deals. If the EU fails at the most significant crisis in a generation, it may not maintain much legitimacy.

And:

> When people judge how painful an experience was, they often place a high value on first and last impressions. The last impressions of the U.S. and U.K. will be pretty positive. Most of the U.S. pandemic will be over by July, even under a subpar vaccination schedule. And it may turn out that mRNA vaccines are more protective against the new strains of Covid than any alternatives….

> Many European countries may end up with fewer deaths per capita than the U.S. But at the end of the pandemic many Europeans may feel like their leaders failed them, that they suffered lockdowns for many months but received little in return. Right now vaccine politics is all about momentum, and so far only a few countries have it.

Here is a related piece by Bruno M.  And a good piece (slow to start) on what went wrong in the EU.
<end_example>
The above example should return one prediction, {
    "paraphrased_prediction": "By July 2021, most of the U.S. pandemic will be over.",
    "exact_quote": "Most of the U.S. pandemic will be over by July, even under a subpar vaccination schedule.",
    "datetime_lower_bound": "2021-07-01",
    "datetime_upper_bound": "2021-07-31",
    "url": "https://marginalrevolution.com/marginalrevolution/2021/01",
    "publish_date": "2021-01-01"
  }.
<example>

That is the topic of my latest Bloomberg column, here is one bit:

> Some of the safer locales may decide to open up, perhaps with visitor quotas. Many tourists will rush there, either occasioning a counterreaction — that is, reducing the destination’s appeal — or filling the quota very rapidly. Then everyone will resume their search for the next open spot, whether it’s Nova Scotia or Iceland. Tourists will compete for status by asking, “Did you get in before the door shut?”

> Some countries might allow visitors to only their more distant (and less desirable?) locales, enforcing movements with electronic monitoring. Central Australia, anyone? I’ve always wanted to see the northwest coast of New Zealand’s South Island.

> Some of the world’s poorer countries might pursue a “herd immunity” strategy, not intentionally, but because their public health institutions are too weak to mount an effective response to Covid-19. A year and a half from now, some of those countries likely will be open to tourism. They won’t be able to prove they are safe, but they might be fine nonetheless. They will attract the kind of risk-seeking tourist who, pre-Covid 19, might have gone to Mali or the more exotic parts of India.

And:

> laces reachable by direct flights will be increasingly attractive. A smaller aviation sector will make connecting flights more logistically difficult, and passengers will appreciate the certainty that comes from knowing they are approved to enter the country of their final destination and don’t have to worry about transfers, delays or cancellations. That will favor London, Paris, Toronto, Rome and other well-connected cities with lots to see and do. More people will want to visit a single locale and not worry about catching the train to the next city. Or they might prefer a driving tour. How about flying to Paris and then a car trip to the famous cathedrals and towns of Normandy?

Maybe. But I might start by giving Parkersburg, West Virginia, a try.
<end_example>
The above should return one prediction, because the quote which makes the prediction is clearly stated outside the quote as being from the blog post author. The quote should be "A year and a half from now, some of those countries likely will be open to tourism. They won’t be able to prove they are safe, but they might be fine nonetheless. They will attract the kind of risk-seeking tourist who, pre-Covid 19, might have gone to Mali or the more exotic parts of India."
    
The content is a concatenation of multiple blog posts. Remember, only extract predictions made by the blogger, not quoted sources.

Now, here is the actual content to extract predictions from:

"#;

pub const VALIDATION_SYSTEM_PROMPT: &str = "You are a prediction validation assistant.";

/// Compose the full user message for validating one extracted record.
pub fn validation_prompt(record: &PredictionRecord, content: &str) -> String {
    format!(
        r#"
Another AI tried to extract a prediction from a blog post.
Determine if this prediction meets ALL of the following requirements:
1. It's made by the blog post author (not a quote from someone else)
2. It's a genuine prediction about a future outcome (not a hypothetical or opinion)
3. It has a specific time frame mentioned, such as 'next year' or 'in 2025'
4. It's the author's opinion/judgment (not a statement about official future plans)

Prediction details:
- Paraphrased prediction: {paraphrased}
- Exact quote: {quote}
- Time frame: From {lower} to {upper}

The content of the blog post which the prediction was extracted from is:

<content>
{content}
</content>

Remember that '> ' is used for block quotes in the content, which are not written by the blog post author.

Answer ONLY with 'Yes' or 'No'.
"#,
        paraphrased = record.paraphrased_prediction,
        quote = record.exact_quote,
        lower = record.datetime_lower_bound,
        upper = record.datetime_upper_bound,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_instructions_cover_exclusions() {
        assert!(EXTRACTION_INSTRUCTIONS.contains("Never include predictions made in markdown block quotes"));
        assert!(EXTRACTION_INSTRUCTIONS.contains("Do not include statements about official future plans"));
        assert!(EXTRACTION_INSTRUCTIONS.contains("Expressing hope is not a prediction"));
        assert!(EXTRACTION_INSTRUCTIONS.contains("*future* relative to the time of writing"));
        assert!(EXTRACTION_INSTRUCTIONS.contains("\"predictions\""));
        assert!(EXTRACTION_INSTRUCTIONS.trim_end().ends_with("extract predictions from:"));
    }

    #[test]
    fn test_extraction_examples_are_complete() {
        for sentence in [
            "    s, as of now, the FDA is moving in the wrong direction and Makary has lost an ally against RFK.",
            "> Mexico is one of the countries most vulnerable to the US president's drive",
            "I think that the FDA's excellent arguments for conditional approval apply to human drugs",
            "on the order of  ~1%–and I thought that was worryingly high.",
            "Most of Europe will not be making significant vaccination progress until April",
            "> At stake is the very legitimacy of the EU.",
            "\"url\": \"https://marginalrevolution.com/marginalrevolution/2021/01\",",
            "\"publish_date\": \"2021-01-01\"",
            "> Some of the safer locales may decide to open up, perhaps with visitor quotas.",
            "They won’t be able to prove they are safe",
            "How about flying to Paris and then a car trip",
        ] {
            assert!(
                EXTRACTION_INSTRUCTIONS.contains(sentence),
                "missing example text: {sentence}"
            );
        }
        assert!(!EXTRACTION_INSTRUCTIONS.contains("introduced by the author as an excerpt"));
        assert!(EXTRACTION_INSTRUCTIONS.ends_with("extract predictions from:\n\n"));
    }

    #[test]
    fn test_validation_prompt_includes_record_and_content() {
        let record = PredictionRecord {
            paraphrased_prediction: "Rates fall in 2025".to_string(),
            exact_quote: "rates will fall next year".to_string(),
            datetime_lower_bound: "2025-01-01".to_string(),
            datetime_upper_bound: "2025-12-31".to_string(),
            url: "https://example.com/blog/2024/05".to_string(),
            publish_date: "2024-05-01".to_string(),
        };
        let prompt = validation_prompt(&record, "I think rates will fall next year.");

        assert!(prompt.contains("- Paraphrased prediction: Rates fall in 2025"));
        assert!(prompt.contains("- Exact quote: rates will fall next year"));
        assert!(prompt.contains("From 2025-01-01 to 2025-12-31"));
        assert!(prompt.contains("<content>\nI think rates will fall next year.\n</content>"));
        assert!(prompt.contains("Answer ONLY with 'Yes' or 'No'."));
    }
}
