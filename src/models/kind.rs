use serde::{Deserialize, Serialize};

/// Logical storage collection. One per submission domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Sacraments,
    Donations,
    Volunteers,
    Contacts,
    MassIntentions,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Sacraments,
        Collection::Donations,
        Collection::Volunteers,
        Collection::Contacts,
        Collection::MassIntentions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Sacraments => "sacraments",
            Collection::Donations => "donations",
            Collection::Volunteers => "volunteers",
            Collection::Contacts => "contacts",
            Collection::MassIntentions => "mass_intentions",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Collection::Sacraments => "Sacrament Requests",
            Collection::Donations => "Donations",
            Collection::Volunteers => "Volunteers & Members",
            Collection::Contacts => "Contact Messages",
            Collection::MassIntentions => "Mass Intentions",
        }
    }

    /// Statuses an administrator may assign to records in this collection.
    pub fn allowed_statuses(self) -> &'static [Status] {
        match self {
            Collection::Sacraments | Collection::MassIntentions => &[
                Status::Pending,
                Status::Approved,
                Status::Rejected,
                Status::Completed,
            ],
            Collection::Donations => &[Status::Pending, Status::Completed, Status::Rejected],
            Collection::Volunteers => &[Status::Pending, Status::Approved, Status::Rejected],
            Collection::Contacts => &[Status::Pending, Status::Completed],
        }
    }

    pub fn allows(self, status: Status) -> bool {
        self.allowed_statuses().contains(&status)
    }

    pub fn kinds(self) -> impl Iterator<Item = FormKind> {
        FormKind::ALL.into_iter().filter(move |k| k.collection() == self)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The public form a submission was made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Baptism,
    FirstCommunion,
    Confirmation,
    Wedding,
    Anointing,
    Funeral,
    Donation,
    Volunteer,
    Membership,
    Contact,
    MassIntention,
}

impl FormKind {
    pub const ALL: [FormKind; 11] = [
        FormKind::Baptism,
        FormKind::FirstCommunion,
        FormKind::Confirmation,
        FormKind::Wedding,
        FormKind::Anointing,
        FormKind::Funeral,
        FormKind::Donation,
        FormKind::Volunteer,
        FormKind::Membership,
        FormKind::Contact,
        FormKind::MassIntention,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Baptism => "baptism",
            FormKind::FirstCommunion => "first_communion",
            FormKind::Confirmation => "confirmation",
            FormKind::Wedding => "wedding",
            FormKind::Anointing => "anointing",
            FormKind::Funeral => "funeral",
            FormKind::Donation => "donation",
            FormKind::Volunteer => "volunteer",
            FormKind::Membership => "membership",
            FormKind::Contact => "contact",
            FormKind::MassIntention => "mass_intention",
        }
    }

    /// Accepts both `first_communion` and the URL form `first-communion`.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.replace('-', "_");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized)
    }

    pub fn slug(self) -> String {
        self.as_str().replace('_', "-")
    }

    pub fn label(self) -> &'static str {
        match self {
            FormKind::Baptism => "Baptism",
            FormKind::FirstCommunion => "First Holy Communion",
            FormKind::Confirmation => "Confirmation",
            FormKind::Wedding => "Holy Matrimony",
            FormKind::Anointing => "Anointing of the Sick",
            FormKind::Funeral => "Funeral Mass",
            FormKind::Donation => "Donation",
            FormKind::Volunteer => "Volunteer Application",
            FormKind::Membership => "Parish Registration",
            FormKind::Contact => "Contact Us",
            FormKind::MassIntention => "Mass Intention",
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            FormKind::Baptism
            | FormKind::FirstCommunion
            | FormKind::Confirmation
            | FormKind::Wedding
            | FormKind::Anointing
            | FormKind::Funeral => Collection::Sacraments,
            FormKind::Donation => Collection::Donations,
            FormKind::Volunteer | FormKind::Membership => Collection::Volunteers,
            FormKind::Contact => Collection::Contacts,
            FormKind::MassIntention => Collection::MassIntentions,
        }
    }

    pub fn is_sacrament(self) -> bool {
        self.collection() == Collection::Sacraments
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Approved,
        Status::Rejected,
        Status::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
            Status::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_belongs_to_a_collection_that_lists_it() {
        for kind in FormKind::ALL {
            assert!(kind.collection().kinds().any(|k| k == kind));
        }
    }

    #[test]
    fn kind_parse_accepts_slugs() {
        assert_eq!(FormKind::parse("first-communion"), Some(FormKind::FirstCommunion));
        assert_eq!(FormKind::parse("mass_intention"), Some(FormKind::MassIntention));
        assert_eq!(FormKind::parse("exorcism"), None);
        assert_eq!(FormKind::MassIntention.slug(), "mass-intention");
    }

    #[test]
    fn every_collection_allows_pending() {
        for collection in Collection::ALL {
            assert!(collection.allows(Status::Pending));
        }
    }

    #[test]
    fn status_sets_are_domain_dependent() {
        assert!(!Collection::Contacts.allows(Status::Approved));
        assert!(!Collection::Donations.allows(Status::Approved));
        assert!(!Collection::Volunteers.allows(Status::Completed));
        assert!(Collection::Sacraments.allows(Status::Completed));
    }

    #[test]
    fn collection_round_trips_through_its_name() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Some(collection));
        }
    }
}
