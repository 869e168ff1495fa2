//! Operator command surface.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Property assistant commands:")]
pub enum Command {
    #[command(description = "show the menu")]
    Start,
    #[command(description = "help")]
    Help,
    #[command(description = "today's arrivals")]
    Today,
    #[command(description = "tomorrow's arrivals")]
    Tomorrow,
    #[command(description = "arrivals in the next 7 days")]
    Upcoming,
    #[command(description = "departures today and tomorrow")]
    Checkouts,
    #[command(description = "cleaning schedule (7 days)")]
    Cleaning,
    #[command(description = "guests currently in house")]
    Current,
    #[command(description = "weekly occupancy and revenue")]
    Week,
    #[command(description = "search guests by name")]
    Search(String),
    #[command(description = "manage invoices for a reservation")]
    Invoice(String),
    #[command(description = "check in guests from ID photos")]
    Checkin,
    #[command(description = "daily digest status and your user id")]
    Notifications,
    #[command(description = "cancel the current flow")]
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        let cmd = Command::parse("/today", "innkeep_bot").unwrap();
        assert_eq!(cmd, Command::Today);
    }

    #[test]
    fn parses_argument_commands() {
        let cmd = Command::parse("/search Marko", "innkeep_bot").unwrap();
        assert_eq!(cmd, Command::Search("Marko".to_string()));
        let cmd = Command::parse("/invoice 12345", "innkeep_bot").unwrap();
        assert_eq!(cmd, Command::Invoice("12345".to_string()));
    }
}
