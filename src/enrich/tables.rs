//! Classification tables for the enricher.
//!
//! Categorical classifiers are ordered `(predicate, label)` rule tables
//! evaluated first-match-wins, so tie-break order is auditable here rather
//! than buried in nested conditionals. All tables are immutable data; the
//! `Enricher` copies them at construction.

/// Which lowercased text a clause inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// apps + description + name
    Combined,
    /// apps only
    Apps,
    /// description + name
    NameDesc,
    /// apps + description
    AppsDesc,
}

/// One keyword-set membership test against a text field
#[derive(Debug, Clone, Copy)]
pub struct Clause {
    pub field: TextField,
    pub keywords: &'static [&'static str],
}

/// A single classification rule. The rule matches when every `all` clause
/// hits and, if `any` is non-empty, at least one `any` clause hits.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub label: &'static str,
    pub any: &'static [Clause],
    pub all: &'static [Clause],
}

const fn any(label: &'static str, clauses: &'static [Clause]) -> Rule {
    Rule {
        label,
        any: clauses,
        all: &[],
    }
}

const fn combined(keywords: &'static [&'static str]) -> Clause {
    Clause {
        field: TextField::Combined,
        keywords,
    }
}

const fn apps(keywords: &'static [&'static str]) -> Clause {
    Clause {
        field: TextField::Apps,
        keywords,
    }
}

// ---------------------------------------------------------------------------
// Keyword sets
// ---------------------------------------------------------------------------

pub const AI_KEYWORDS: &[&str] = &[
    "openai",
    "chatgpt",
    "gpt-3",
    "gpt-4",
    "claude",
    "anthropic",
    "gemini",
    "ai agent",
    "llm",
    "language model",
    "chat model",
    "completion",
    "palm",
    "bard",
    "ai",
    "artificial intelligence",
];

pub const CODE_KEYWORDS: &[&str] = &["code", "javascript", "python", "function", "script"];

pub const HTTP_KEYWORDS: &[&str] = &["http request", "api call", "rest api", "webhook"];

pub const SPREADSHEET_APPS: &[&str] =
    &["google sheets", "sheets", "excel", "airtable", "spreadsheet"];

pub const EMAIL_APPS: &[&str] = &["gmail", "email", "outlook", "mailchimp", "sendgrid", "mailgun"];

pub const STORAGE_APPS: &[&str] =
    &["google drive", "drive", "dropbox", "onedrive", "box", "storage"];

pub const COMMUNICATION_APPS: &[&str] = &[
    "slack",
    "telegram",
    "discord",
    "teams",
    "microsoft teams",
    "whatsapp",
    "messenger",
];

pub const CRM_APPS: &[&str] = &["salesforce", "hubspot", "pipedrive", "crm", "zoho crm"];

pub const SOCIAL_MEDIA_APPS: &[&str] = &[
    "facebook",
    "instagram",
    "linkedin",
    "twitter",
    "tiktok",
    "youtube",
    "pinterest",
    "social",
];

pub const ECOMMERCE_APPS: &[&str] = &[
    "shopify",
    "woocommerce",
    "stripe",
    "paypal",
    "square",
    "ecommerce",
];

pub const PROJECT_MGMT_APPS: &[&str] = &[
    "trello", "asana", "jira", "notion", "clickup", "monday", "project",
];

pub const FORMS_APPS: &[&str] = &["typeform", "google forms", "forms", "jotform", "survey"];

pub const WEBHOOK_KEYWORDS: &[&str] = &["webhook", "gateway"];

pub const SCHEDULE_KEYWORDS: &[&str] = &["schedule", "daily", "weekly", "cron", "recurring"];

pub const REALTIME_KEYWORDS: &[&str] = &["real-time", "instant", "immediately", "watch"];

pub const CONDITIONAL_KEYWORDS: &[&str] = &["if", "conditional", "filter", "branch", "router"];

pub const LOOP_KEYWORDS: &[&str] = &["loop", "iterate", "repeat", "for each"];

pub const LLM_KEYWORDS: &[&str] = &["llm", "language model", "chat model", "completion"];

pub const EMBEDDING_KEYWORDS: &[&str] =
    &["embedding", "vector", "pinecone", "qdrant", "weaviate"];

pub const VISION_KEYWORDS: &[&str] = &[
    "image generation",
    "dall-e",
    "vision",
    "image analysis",
    "stable diffusion",
];

pub const VOICE_KEYWORDS: &[&str] =
    &["whisper", "voice", "audio", "transcribe", "speech", "eleven"];

pub const MEMORY_KEYWORDS: &[&str] = &["memory", "conversation", "context", "history"];

pub const RAG_KEYWORDS: &[&str] = &["vector", "embedding", "pinecone", "qdrant", "semantic"];

pub const ENTERPRISE_APPS: &[&str] = &["salesforce", "workday", "sap", "oracle", "servicenow"];

pub const SMB_APPS: &[&str] = &["quickbooks", "xero", "mailchimp"];

pub const KEYWORD_STOPWORDS: &[&str] =
    &["and", "the", "a", "to", "from", "with", "for", "in", "on", "at", "of"];

// ---------------------------------------------------------------------------
// Categorical rule tables, first-match-wins
// ---------------------------------------------------------------------------

pub const AUTOMATION_TYPE_RULES: &[Rule] = &[
    any("AI_AUTOMATION", &[combined(AI_KEYWORDS)]),
    any(
        "MARKETING",
        &[
            combined(&["marketing", "campaign", "ads", "lead"]),
            apps(SOCIAL_MEDIA_APPS),
        ],
    ),
    any(
        "COMMUNICATION",
        &[
            apps(COMMUNICATION_APPS),
            combined(&["message", "chat", "notification"]),
        ],
    ),
    any(
        "ECOMMERCE",
        &[
            apps(ECOMMERCE_APPS),
            combined(&["order", "product", "shop", "payment"]),
        ],
    ),
    any("DATA_SYNC", &[combined(&["sync", "backup", "export", "import"])]),
    any(
        "PRODUCTIVITY",
        &[
            apps(PROJECT_MGMT_APPS),
            combined(&["task", "project", "calendar", "schedule"]),
        ],
    ),
    any(
        "HR",
        &[combined(&["hr", "hiring", "recruitment", "employee", "applicant"])],
    ),
    any(
        "CUSTOMER_SUPPORT",
        &[combined(&["support", "ticket", "helpdesk", "customer service"])],
    ),
    any(
        "ANALYTICS",
        &[combined(&["analytics", "report", "dashboard", "metrics"])],
    ),
    any(
        "DEVELOPMENT",
        &[combined(CODE_KEYWORDS), combined(HTTP_KEYWORDS)],
    ),
];

pub const AUTOMATION_TYPE_DEFAULT: &str = "INTEGRATION";

pub const AI_SUBTYPE_RULES: &[Rule] = &[
    any("CHATBOT", &[combined(&["chatbot", "chat"])]),
    any(
        "CONTENT_GENERATION",
        &[combined(&["content", "generation", "writing"])],
    ),
    any("SUMMARIZATION", &[combined(&["summary", "summarize"])]),
    any("CLASSIFICATION", &[combined(&["classification", "categoriz"])]),
    any("EXTRACTION", &[combined(&["extraction", "extract"])]),
];

pub const MARKETING_SUBTYPE_RULES: &[Rule] = &[
    any("LEAD_CAPTURE", &[combined(&["lead"])]),
    any("EMAIL_AUTOMATION", &[combined(&["email"])]),
    any("SOCIAL_POSTING", &[combined(&["social", "post"])]),
    any("CAMPAIGN_MANAGEMENT", &[combined(&["campaign"])]),
];

pub const DATA_SYNC_SUBTYPE_RULES: &[Rule] = &[
    any("DATA_BACKUP", &[combined(&["backup"])]),
    any("DATA_SYNCHRONIZATION", &[combined(&["sync"])]),
    any("DATA_SCRAPING", &[combined(&["scraping", "scrape"])]),
];

pub const COMMUNICATION_SUBTYPE_RULES: &[Rule] = &[
    any("NOTIFICATION", &[combined(&["notification", "alert"])]),
    any("MESSAGING", &[combined(&["message"])]),
];

pub const SUPPORT_SUBTYPE_RULES: &[Rule] = &[any("TICKET_MANAGEMENT", &[combined(&["ticket"])])];

pub const PRODUCTIVITY_SUBTYPE_RULES: &[Rule] = &[
    any("FORM_PROCESSING", &[apps(FORMS_APPS), combined(&["form"])]),
    any("FILE_MANAGEMENT", &[combined(&["file", "document"])]),
    any("TASK_MANAGEMENT", &[combined(&["task"])]),
];

pub const INDUSTRY_RULES: &[Rule] = &[
    any(
        "SALES",
        &[combined(&["sales", "crm", "deal", "pipeline"]), apps(CRM_APPS)],
    ),
    any(
        "MARKETING",
        &[
            combined(&["marketing", "campaign", "lead", "seo"]),
            apps(SOCIAL_MEDIA_APPS),
        ],
    ),
    any(
        "HR",
        &[combined(&["hr", "hiring", "recruitment", "employee", "payroll"])],
    ),
    any(
        "IT",
        &[
            combined(&["it", "devops", "infrastructure", "server"]),
            combined(CODE_KEYWORDS),
        ],
    ),
    any(
        "CUSTOMER_SUPPORT",
        &[combined(&["support", "ticket", "customer service", "helpdesk"])],
    ),
    any(
        "FINANCE",
        &[combined(&["finance", "accounting", "invoice", "payment", "expense"])],
    ),
    any(
        "OPERATIONS",
        &[combined(&["operations", "inventory", "supply chain", "logistics"])],
    ),
    any(
        "HEALTHCARE",
        &[combined(&["healthcare", "medical", "patient", "health"])],
    ),
    any(
        "EDUCATION",
        &[combined(&["education", "learning", "student", "course", "training"])],
    ),
    any(
        "ECOMMERCE",
        &[
            apps(ECOMMERCE_APPS),
            combined(&["ecommerce", "shop", "order", "product"]),
        ],
    ),
];

pub const INDUSTRY_DEFAULT: &str = "GENERAL_BUSINESS";

pub const TRIGGER_RULES: &[Rule] = &[
    any("WEBHOOK", &[combined(&["webhook"]), apps(&["gateway"])]),
    any("SCHEDULE", &[combined(&["schedule", "daily", "weekly", "cron"])]),
    any(
        "FORM_SUBMISSION",
        &[apps(FORMS_APPS), combined(&["form", "submission"])],
    ),
    Rule {
        label: "EMAIL",
        all: &[apps(EMAIL_APPS)],
        any: &[combined(&["new email", "incoming email"])],
    },
    any("NEW_ROW", &[combined(&["new row", "new record"])]),
    any("FILE_UPLOAD", &[combined(&["file", "upload"])]),
    any("MESSAGE", &[combined(&["message"]), apps(COMMUNICATION_APPS)]),
    any("MANUAL", &[combined(&["manual"])]),
];

pub const TRIGGER_DEFAULT: &str = "WATCH";

pub const ACTION_RULES: &[Rule] = &[
    any("CREATE_RECORD", &[combined(&["create", "add"])]),
    any("UPDATE_DATA", &[combined(&["update", "edit"])]),
    Rule {
        label: "SEND_EMAIL",
        all: &[combined(&["send"]), apps(EMAIL_APPS)],
        any: &[],
    },
    any("SEND_MESSAGE", &[combined(&["send"])]),
    Rule {
        label: "SEND_MESSAGE",
        all: &[combined(&["post"]), apps(COMMUNICATION_APPS)],
        any: &[],
    },
    any("GENERATE_CONTENT", &[combined(&["generate", "create content"])]),
    Rule {
        label: "POST_SOCIAL",
        all: &[combined(&["post"]), apps(SOCIAL_MEDIA_APPS)],
        any: &[],
    },
    any("CREATE_FILE", &[combined(&["file"])]),
    any("ANALYZE_DATA", &[combined(&["analyze", "report"])]),
];

pub const ACTION_DEFAULT: &str = "PROCESS_DATA";

pub const AI_USE_CASE_RULES: &[Rule] = &[
    any("CHATBOT", &[combined(&["chatbot", "chat"])]),
    any("CONTENT_GENERATION", &[combined(&["content", "writing", "blog"])]),
    any("SUMMARIZATION", &[combined(&["summary", "summarize"])]),
    any("CLASSIFICATION", &[combined(&["classif", "categoriz"])]),
    any("EXTRACTION", &[combined(&["extract"])]),
    any("TRANSLATION", &[combined(&["translate", "translation"])]),
    any("SENTIMENT_ANALYSIS", &[combined(&["sentiment"])]),
    any(
        "IMAGE_GENERATION",
        &[combined(&["image", "dall-e", "midjourney"])],
    ),
    any(
        "TRANSCRIPTION",
        &[combined(&["transcri", "whisper", "audio"])],
    ),
    any(
        "EMBEDDINGS_SEARCH",
        &[combined(&["embedding", "vector", "semantic"])],
    ),
];

pub const AI_USE_CASE_DEFAULT: &str = "AI_PROCESSING";

/// AI providers are counted, not first-matched: more than one hit reports
/// MULTIPLE. Keywords are checked against the apps text.
pub const AI_PROVIDER_RULES: &[(&str, &[&str])] = &[
    ("OPENAI", &["openai", "gpt", "chatgpt"]),
    ("ANTHROPIC", &["anthropic", "claude"]),
    ("GOOGLE", &["google", "gemini", "palm"]),
];
