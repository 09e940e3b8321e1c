//! Slash commands understood by the browser bot.

const SERVICE_CENTER_PREFIX: &str = "service_center_";
const MANAGE_SERVICE_CENTER_PREFIX: &str = "manage_service_center_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Settings,
    /// `/service_centers [query] [city_id=Y]`
    ServiceCenters(SearchArgs),
    /// Raw argument text; validated by the handler so it can answer with
    /// the right message.
    ApproveClaim(String),
    RejectClaim(String),
    /// `/service_center_{id}`
    ServiceCenter(i64),
    /// `/manage_service_center_{id}`
    ManageServiceCenter(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchArgs {
    pub query: String,
    pub city_id: Option<i64>,
    /// The `city_id=` value was present but not a number.
    pub bad_city_id: bool,
}

impl SearchArgs {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.city_id.is_none() && !self.bad_city_id
    }
}

impl Command {
    /// Parses a message text. Returns `None` for plain text and for
    /// unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        // Commands in groups arrive as `/cmd@bot_name`.
        let name = head.split('@').next().unwrap_or(head);

        match name {
            "start" => Some(Self::Start),
            "settings" => Some(Self::Settings),
            "service_centers" => Some(Self::ServiceCenters(parse_search_args(args))),
            "approve_claim" => Some(Self::ApproveClaim(args.to_string())),
            "reject_claim" => Some(Self::RejectClaim(args.to_string())),
            _ => {
                if let Some(id) = name.strip_prefix(MANAGE_SERVICE_CENTER_PREFIX) {
                    id.parse().ok().map(Self::ManageServiceCenter)
                } else if let Some(id) = name.strip_prefix(SERVICE_CENTER_PREFIX) {
                    id.parse().ok().map(Self::ServiceCenter)
                } else {
                    None
                }
            }
        }
    }
}

/// The last free word wins as the query; `city_id=Y` selects the city.
fn parse_search_args(args: &str) -> SearchArgs {
    let mut parsed = SearchArgs::default();
    for arg in args.split_whitespace() {
        if let Some(raw) = arg.strip_prefix("city_id=") {
            match raw.parse() {
                Ok(id) => parsed.city_id = Some(id),
                Err(_) => parsed.bad_city_id = true,
            }
        } else {
            parsed.query = arg.to_string();
        }
    }
    parsed
}

/// Parses the single id argument of the claim moderation commands.
pub fn parse_claim_id(args: &str) -> ClaimIdArg {
    let mut words = args.split_whitespace();
    match (words.next(), words.next()) {
        (Some(id), None) => match id.parse() {
            Ok(id) => ClaimIdArg::Id(id),
            Err(_) => ClaimIdArg::Invalid,
        },
        _ => ClaimIdArg::Missing,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimIdArg {
    Id(i64),
    /// No argument, or more than one.
    Missing,
    Invalid,
}
