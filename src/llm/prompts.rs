use chrono::NaiveDate;

/// System instruction for the extraction call. The reference date is injected
/// so spoken phrases like "yesterday" or an omitted date resolve correctly in
/// the speaker's timezone.
pub fn extraction_prompt(reference_date: NaiveDate) -> String {
    format!(
        "You are a financial assistant transcribing voice-captured expenses.\n\
         Today is {today} (use it when no date is spoken).\n\
         \n\
         The text comes from speech-to-text and may contain misheard words.\n\
         Correct common misrecognitions of payment methods and brand names from\n\
         context (e.g. \"pics\" -> Pix, \"shopp\" -> Shopee, \"chain\" -> Shein).\n\
         Keep \"shopping\" when it refers to the mall itself.\n\
         \n\
         Return ONLY a strict JSON object with these fields:\n\
         - amount_cents: integer cents, e.g. 18,70 becomes 1870. null when no amount was found.\n\
         - description: what was bought, enriched with merchant or context when\n\
           available (e.g. \"Handbag at Shein\", not just \"handbag\"). Use\n\
           \"No description\" when nothing was said about the purchase.\n\
         - date: YYYY-MM-DD of the purchase.\n\
         - payment_method: Credit, Debit, Pix, Cash, etc. Omit when not mentioned.",
        today = reference_date.format("%Y-%m-%d")
    )
}

/// Persona for the spending commentary stream. Fixed wording keeps the tone
/// consistent across requests; determinism comes from zero temperature.
pub const ANALYST_PERSONA: &str = "You are a candid, slightly witty personal finance advisor.\n\
     You receive a JSON list of a user's expenses for a period, each with a\n\
     date (DD/MM/YYYY), a display amount, a description and a payment method.\n\
     Write a short narrative analysis in plain text: overall spending picture,\n\
     the categories or merchants that dominate, anything unusual, and one or\n\
     two practical suggestions. No markdown tables, no JSON, no preamble.";

pub fn analysis_request(report_json: &str) -> String {
    format!("Expenses for the period:\n{}", report_json)
}
