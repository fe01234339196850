//! Records exchanged with an external service-discovery layer.
//!
//! Browsing and announcing are done elsewhere; these types only carry what
//! a resolved service means to a client and what a server wants announced.

use std::net::{IpAddr, SocketAddr};

/// DNS-SD service type for DAAP shares.
pub const SERVICE_TYPE: &str = "_daap._tcp";

const PROTECTED_SUFFIX: &str = "_PW";
const TXT_PASSWORD: &str = "Password";
const TXT_MACHINE_NAME: &str = "Machine Name";
const TXT_MACHINE_ID: &str = "Machine ID";
const TXT_VERSION: &str = "txtvers";

/// A share found by the discovery layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub address: IpAddr,
    pub port: u16,
    pub name: String,
    pub is_protected: bool,
}

impl ServiceRecord {
    /// Interprets a resolved service.
    ///
    /// A `_PW` suffix on the service name or a `Password=true` TXT entry
    /// marks the share protected. A `Machine Name` entry replaces the
    /// service name. TXT keys match case-insensitively.
    pub fn from_resolved<K, V>(
        address: IpAddr,
        port: u16,
        service_name: &str,
        txt: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (mut name, mut is_protected) = match service_name.strip_suffix(PROTECTED_SUFFIX) {
            Some(stripped) => (stripped.to_owned(), true),
            None => (service_name.to_owned(), false),
        };
        for (key, value) in txt {
            let (key, value) = (key.as_ref(), value.as_ref());
            if key.eq_ignore_ascii_case(TXT_PASSWORD) {
                is_protected |= value.eq_ignore_ascii_case("true");
            } else if key.eq_ignore_ascii_case(TXT_MACHINE_NAME) && !value.is_empty() {
                name = value.to_owned();
            }
        }
        Self {
            address,
            port,
            name,
            is_protected,
        }
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

/// What a server asks the discovery layer to announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub name: String,
    pub port: u16,
    pub txt: Vec<(String, String)>,
}

impl Advertisement {
    #[must_use]
    pub fn new(name: &str, port: u16, is_protected: bool, machine_id: Option<&str>) -> Self {
        let mut txt = vec![
            (
                TXT_PASSWORD.to_owned(),
                if is_protected { "true" } else { "false" }.to_owned(),
            ),
            (TXT_MACHINE_NAME.to_owned(), name.to_owned()),
        ];
        if let Some(id) = machine_id {
            txt.push((TXT_MACHINE_ID.to_owned(), id.to_owned()));
        }
        txt.push((TXT_VERSION.to_owned(), "1".to_owned()));
        Self {
            name: name.to_owned(),
            port,
            txt,
        }
    }

    #[must_use]
    pub const fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    #[must_use]
    pub fn txt_value(&self, key: &str) -> Option<&str> {
        self.txt
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const LOCAL: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn plain_service() {
        let record = ServiceRecord::from_resolved(LOCAL, 3689, "Shared", Vec::<(&str, &str)>::new());
        assert_eq!(record.name, "Shared");
        assert!(!record.is_protected);
        assert_eq!(record.socket_addr(), SocketAddr::new(LOCAL, 3689));
    }

    #[test]
    fn suffix_marks_protected() {
        let record = ServiceRecord::from_resolved(LOCAL, 3689, "Shared_PW", [("txtvers", "1")]);
        assert_eq!(record.name, "Shared");
        assert!(record.is_protected);
    }

    #[test]
    fn txt_entries_override() {
        let record = ServiceRecord::from_resolved(
            LOCAL,
            3689,
            "abc123",
            [("password", "TRUE"), ("machine name", "Kitchen")],
        );
        assert_eq!(record.name, "Kitchen");
        assert!(record.is_protected);
    }

    #[test]
    fn advertisement_txt() {
        let ad = Advertisement::new("Music", 3689, true, Some("42"));
        assert_eq!(ad.service_type(), "_daap._tcp");
        assert_eq!(ad.txt_value("Password"), Some("true"));
        assert_eq!(ad.txt_value("Machine Name"), Some("Music"));
        assert_eq!(ad.txt_value("Machine ID"), Some("42"));
        assert_eq!(ad.txt_value("txtvers"), Some("1"));

        let open = Advertisement::new("Music", 3689, false, None);
        assert_eq!(open.txt_value("password"), Some("false"));
        assert_eq!(open.txt_value("Machine ID"), None);
    }

    #[test]
    fn advertisement_resolves_back() {
        let ad = Advertisement::new("Den", 4000, true, None);
        let record = ServiceRecord::from_resolved(LOCAL, ad.port, "x", ad.txt.clone());
        assert_eq!(record.name, "Den");
        assert!(record.is_protected);
        assert_eq!(record.port, 4000);
    }
}
