//! Fixed strings shown to the user or sent to the model

/// Instruction preamble sent as the first message of every request
pub const SYSTEM_PROMPT: &str = "You are Tapix-AI, an expert personal finance assistant who can explain \
transactions, spot anomalies, and give budgeting tips in simple language.\n\
Only use the transaction context you are given; if the answer is not in it, say so.\n\
Amounts are signed: negative means money spent, positive means money received.\n\
Keep answers short, concrete, and quote amounts with two decimals.";

/// Seeded assistant message at session start
pub const GREETING: &str = "Hello! I'm your AI financial assistant powered by Tapix. I can help you \
understand your spending patterns, track expenses, and provide insights about your finances.\n\n\
What I can do:\n\
- Analyse spending at specific merchants (e.g. Tesco)\n\
- Track category budgets (e.g. Groceries)\n\
- Compare periods (e.g. last month vs this month)\n\
- Identify recurring payments and subscriptions\n\
- Surface personalised saving tips";

/// Shortcuts offered by the UI; selecting one behaves exactly like typing it
pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "How much did I spend at Tesco this month?",
    "What's my average weekly spending on groceries?",
    "Show me my restaurant expenses for the last 3 months",
    "Am I spending more on Amazon compared to last month?",
    "What are my recurring subscriptions?",
];

/// Reply used when no credential is configured; the backend is never called
pub const MISSING_CREDENTIAL_ADVISORY: &str = "I can't reach the AI model yet: no API key is configured. \
Set OPENAI_API_KEY (or ANTHROPIC_API_KEY for provider = \"anthropic\"), \
or run `tapix auth paste-openai-api-key`, then ask again. \
You can also switch to provider = \"offline\" for built-in answers.";

/// Header line that introduces the serialized context object
pub const CONTEXT_HEADER: &str = "Here is additional context you can use:";

/// User-facing reply for a failed call to `backend`
pub fn apology(backend: &str, error: &dyn std::fmt::Display) -> String {
    format!("Sorry, I ran into an error talking to {backend}: {error}. Please try again later.")
}
