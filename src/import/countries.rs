//! Static ISO 3166-1 country table used to resolve country names in imports.
//!
//! Names follow the English short names shown in profile forms; a handful of
//! common alternative spellings resolve through [`ALIASES`].

/// A country with its ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country { code: "AF", name: "Afghanistan" },
    Country { code: "AX", name: "Åland Islands" },
    Country { code: "AL", name: "Albania" },
    Country { code: "DZ", name: "Algeria" },
    Country { code: "AS", name: "American Samoa" },
    Country { code: "AD", name: "Andorra" },
    Country { code: "AO", name: "Angola" },
    Country { code: "AI", name: "Anguilla" },
    Country { code: "AQ", name: "Antarctica" },
    Country { code: "AG", name: "Antigua and Barbuda" },
    Country { code: "AR", name: "Argentina" },
    Country { code: "AM", name: "Armenia" },
    Country { code: "AW", name: "Aruba" },
    Country { code: "AU", name: "Australia" },
    Country { code: "AT", name: "Austria" },
    Country { code: "AZ", name: "Azerbaijan" },
    Country { code: "BS", name: "Bahamas" },
    Country { code: "BH", name: "Bahrain" },
    Country { code: "BD", name: "Bangladesh" },
    Country { code: "BB", name: "Barbados" },
    Country { code: "BY", name: "Belarus" },
    Country { code: "BE", name: "Belgium" },
    Country { code: "BZ", name: "Belize" },
    Country { code: "BJ", name: "Benin" },
    Country { code: "BM", name: "Bermuda" },
    Country { code: "BT", name: "Bhutan" },
    Country { code: "BO", name: "Bolivia" },
    Country { code: "BQ", name: "Bonaire, Sint Eustatius and Saba" },
    Country { code: "BA", name: "Bosnia and Herzegovina" },
    Country { code: "BW", name: "Botswana" },
    Country { code: "BV", name: "Bouvet Island" },
    Country { code: "BR", name: "Brazil" },
    Country { code: "IO", name: "British Indian Ocean Territory" },
    Country { code: "BN", name: "Brunei" },
    Country { code: "BG", name: "Bulgaria" },
    Country { code: "BF", name: "Burkina Faso" },
    Country { code: "BI", name: "Burundi" },
    Country { code: "CV", name: "Cabo Verde" },
    Country { code: "KH", name: "Cambodia" },
    Country { code: "CM", name: "Cameroon" },
    Country { code: "CA", name: "Canada" },
    Country { code: "KY", name: "Cayman Islands" },
    Country { code: "CF", name: "Central African Republic" },
    Country { code: "TD", name: "Chad" },
    Country { code: "CL", name: "Chile" },
    Country { code: "CN", name: "China" },
    Country { code: "CX", name: "Christmas Island" },
    Country { code: "CC", name: "Cocos (Keeling) Islands" },
    Country { code: "CO", name: "Colombia" },
    Country { code: "KM", name: "Comoros" },
    Country { code: "CG", name: "Congo" },
    Country { code: "CD", name: "Congo (the Democratic Republic of the)" },
    Country { code: "CK", name: "Cook Islands" },
    Country { code: "CR", name: "Costa Rica" },
    Country { code: "CI", name: "Côte d'Ivoire" },
    Country { code: "HR", name: "Croatia" },
    Country { code: "CU", name: "Cuba" },
    Country { code: "CW", name: "Curaçao" },
    Country { code: "CY", name: "Cyprus" },
    Country { code: "CZ", name: "Czechia" },
    Country { code: "DK", name: "Denmark" },
    Country { code: "DJ", name: "Djibouti" },
    Country { code: "DM", name: "Dominica" },
    Country { code: "DO", name: "Dominican Republic" },
    Country { code: "EC", name: "Ecuador" },
    Country { code: "EG", name: "Egypt" },
    Country { code: "SV", name: "El Salvador" },
    Country { code: "GQ", name: "Equatorial Guinea" },
    Country { code: "ER", name: "Eritrea" },
    Country { code: "EE", name: "Estonia" },
    Country { code: "SZ", name: "Eswatini" },
    Country { code: "ET", name: "Ethiopia" },
    Country { code: "FK", name: "Falkland Islands (Malvinas)" },
    Country { code: "FO", name: "Faroe Islands" },
    Country { code: "FJ", name: "Fiji" },
    Country { code: "FI", name: "Finland" },
    Country { code: "FR", name: "France" },
    Country { code: "GF", name: "French Guiana" },
    Country { code: "PF", name: "French Polynesia" },
    Country { code: "TF", name: "French Southern Territories" },
    Country { code: "GA", name: "Gabon" },
    Country { code: "GM", name: "Gambia" },
    Country { code: "GE", name: "Georgia" },
    Country { code: "DE", name: "Germany" },
    Country { code: "GH", name: "Ghana" },
    Country { code: "GI", name: "Gibraltar" },
    Country { code: "GR", name: "Greece" },
    Country { code: "GL", name: "Greenland" },
    Country { code: "GD", name: "Grenada" },
    Country { code: "GP", name: "Guadeloupe" },
    Country { code: "GU", name: "Guam" },
    Country { code: "GT", name: "Guatemala" },
    Country { code: "GG", name: "Guernsey" },
    Country { code: "GN", name: "Guinea" },
    Country { code: "GW", name: "Guinea-Bissau" },
    Country { code: "GY", name: "Guyana" },
    Country { code: "HT", name: "Haiti" },
    Country { code: "HM", name: "Heard Island and McDonald Islands" },
    Country { code: "VA", name: "Holy See" },
    Country { code: "HN", name: "Honduras" },
    Country { code: "HK", name: "Hong Kong" },
    Country { code: "HU", name: "Hungary" },
    Country { code: "IS", name: "Iceland" },
    Country { code: "IN", name: "India" },
    Country { code: "ID", name: "Indonesia" },
    Country { code: "IR", name: "Iran" },
    Country { code: "IQ", name: "Iraq" },
    Country { code: "IE", name: "Ireland" },
    Country { code: "IM", name: "Isle of Man" },
    Country { code: "IL", name: "Israel" },
    Country { code: "IT", name: "Italy" },
    Country { code: "JM", name: "Jamaica" },
    Country { code: "JP", name: "Japan" },
    Country { code: "JE", name: "Jersey" },
    Country { code: "JO", name: "Jordan" },
    Country { code: "KZ", name: "Kazakhstan" },
    Country { code: "KE", name: "Kenya" },
    Country { code: "KI", name: "Kiribati" },
    Country { code: "KW", name: "Kuwait" },
    Country { code: "KG", name: "Kyrgyzstan" },
    Country { code: "LA", name: "Laos" },
    Country { code: "LV", name: "Latvia" },
    Country { code: "LB", name: "Lebanon" },
    Country { code: "LS", name: "Lesotho" },
    Country { code: "LR", name: "Liberia" },
    Country { code: "LY", name: "Libya" },
    Country { code: "LI", name: "Liechtenstein" },
    Country { code: "LT", name: "Lithuania" },
    Country { code: "LU", name: "Luxembourg" },
    Country { code: "MO", name: "Macao" },
    Country { code: "MG", name: "Madagascar" },
    Country { code: "MW", name: "Malawi" },
    Country { code: "MY", name: "Malaysia" },
    Country { code: "MV", name: "Maldives" },
    Country { code: "ML", name: "Mali" },
    Country { code: "MT", name: "Malta" },
    Country { code: "MH", name: "Marshall Islands" },
    Country { code: "MQ", name: "Martinique" },
    Country { code: "MR", name: "Mauritania" },
    Country { code: "MU", name: "Mauritius" },
    Country { code: "YT", name: "Mayotte" },
    Country { code: "MX", name: "Mexico" },
    Country { code: "FM", name: "Micronesia (Federated States of)" },
    Country { code: "MD", name: "Moldova" },
    Country { code: "MC", name: "Monaco" },
    Country { code: "MN", name: "Mongolia" },
    Country { code: "ME", name: "Montenegro" },
    Country { code: "MS", name: "Montserrat" },
    Country { code: "MA", name: "Morocco" },
    Country { code: "MZ", name: "Mozambique" },
    Country { code: "MM", name: "Myanmar" },
    Country { code: "NA", name: "Namibia" },
    Country { code: "NR", name: "Nauru" },
    Country { code: "NP", name: "Nepal" },
    Country { code: "NL", name: "Netherlands" },
    Country { code: "NC", name: "New Caledonia" },
    Country { code: "NZ", name: "New Zealand" },
    Country { code: "NI", name: "Nicaragua" },
    Country { code: "NE", name: "Niger" },
    Country { code: "NG", name: "Nigeria" },
    Country { code: "NU", name: "Niue" },
    Country { code: "NF", name: "Norfolk Island" },
    Country { code: "KP", name: "North Korea" },
    Country { code: "MK", name: "North Macedonia" },
    Country { code: "MP", name: "Northern Mariana Islands" },
    Country { code: "NO", name: "Norway" },
    Country { code: "OM", name: "Oman" },
    Country { code: "PK", name: "Pakistan" },
    Country { code: "PW", name: "Palau" },
    Country { code: "PS", name: "Palestine, State of" },
    Country { code: "PA", name: "Panama" },
    Country { code: "PG", name: "Papua New Guinea" },
    Country { code: "PY", name: "Paraguay" },
    Country { code: "PE", name: "Peru" },
    Country { code: "PH", name: "Philippines" },
    Country { code: "PN", name: "Pitcairn" },
    Country { code: "PL", name: "Poland" },
    Country { code: "PT", name: "Portugal" },
    Country { code: "PR", name: "Puerto Rico" },
    Country { code: "QA", name: "Qatar" },
    Country { code: "RE", name: "Réunion" },
    Country { code: "RO", name: "Romania" },
    Country { code: "RU", name: "Russia" },
    Country { code: "RW", name: "Rwanda" },
    Country { code: "BL", name: "Saint Barthélemy" },
    Country { code: "SH", name: "Saint Helena, Ascension and Tristan da Cunha" },
    Country { code: "KN", name: "Saint Kitts and Nevis" },
    Country { code: "LC", name: "Saint Lucia" },
    Country { code: "MF", name: "Saint Martin (French part)" },
    Country { code: "PM", name: "Saint Pierre and Miquelon" },
    Country { code: "VC", name: "Saint Vincent and the Grenadines" },
    Country { code: "WS", name: "Samoa" },
    Country { code: "SM", name: "San Marino" },
    Country { code: "ST", name: "Sao Tome and Principe" },
    Country { code: "SA", name: "Saudi Arabia" },
    Country { code: "SN", name: "Senegal" },
    Country { code: "RS", name: "Serbia" },
    Country { code: "SC", name: "Seychelles" },
    Country { code: "SL", name: "Sierra Leone" },
    Country { code: "SG", name: "Singapore" },
    Country { code: "SX", name: "Sint Maarten (Dutch part)" },
    Country { code: "SK", name: "Slovakia" },
    Country { code: "SI", name: "Slovenia" },
    Country { code: "SB", name: "Solomon Islands" },
    Country { code: "SO", name: "Somalia" },
    Country { code: "ZA", name: "South Africa" },
    Country { code: "GS", name: "South Georgia and the South Sandwich Islands" },
    Country { code: "KR", name: "South Korea" },
    Country { code: "SS", name: "South Sudan" },
    Country { code: "ES", name: "Spain" },
    Country { code: "LK", name: "Sri Lanka" },
    Country { code: "SD", name: "Sudan" },
    Country { code: "SR", name: "Suriname" },
    Country { code: "SJ", name: "Svalbard and Jan Mayen" },
    Country { code: "SE", name: "Sweden" },
    Country { code: "CH", name: "Switzerland" },
    Country { code: "SY", name: "Syria" },
    Country { code: "TW", name: "Taiwan" },
    Country { code: "TJ", name: "Tajikistan" },
    Country { code: "TZ", name: "Tanzania" },
    Country { code: "TH", name: "Thailand" },
    Country { code: "TL", name: "Timor-Leste" },
    Country { code: "TG", name: "Togo" },
    Country { code: "TK", name: "Tokelau" },
    Country { code: "TO", name: "Tonga" },
    Country { code: "TT", name: "Trinidad and Tobago" },
    Country { code: "TN", name: "Tunisia" },
    Country { code: "TR", name: "Türkiye" },
    Country { code: "TM", name: "Turkmenistan" },
    Country { code: "TC", name: "Turks and Caicos Islands" },
    Country { code: "TV", name: "Tuvalu" },
    Country { code: "UG", name: "Uganda" },
    Country { code: "UA", name: "Ukraine" },
    Country { code: "AE", name: "United Arab Emirates" },
    Country { code: "GB", name: "United Kingdom" },
    Country { code: "UM", name: "United States Minor Outlying Islands" },
    Country { code: "US", name: "United States of America" },
    Country { code: "UY", name: "Uruguay" },
    Country { code: "UZ", name: "Uzbekistan" },
    Country { code: "VU", name: "Vanuatu" },
    Country { code: "VE", name: "Venezuela" },
    Country { code: "VN", name: "Vietnam" },
    Country { code: "VG", name: "Virgin Islands (British)" },
    Country { code: "VI", name: "Virgin Islands (U.S.)" },
    Country { code: "WF", name: "Wallis and Futuna" },
    Country { code: "EH", name: "Western Sahara" },
    Country { code: "YE", name: "Yemen" },
    Country { code: "ZM", name: "Zambia" },
    Country { code: "ZW", name: "Zimbabwe" },
];

/// Alternative spellings mapped to alpha-2 codes.
pub const ALIASES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("USA", "US"),
    ("Great Britain", "GB"),
    ("UK", "GB"),
    ("Korea", "KR"),
    ("Republic of Korea", "KR"),
    ("Russian Federation", "RU"),
    ("Viet Nam", "VN"),
    ("Iran (Islamic Republic of)", "IR"),
    ("Turkey", "TR"),
    ("Czech Republic", "CZ"),
    ("Cape Verde", "CV"),
    ("Swaziland", "SZ"),
    ("Macedonia", "MK"),
    ("Ivory Coast", "CI"),
    ("Bolivia (Plurinational State of)", "BO"),
    ("Venezuela (Bolivarian Republic of)", "VE"),
    ("Tanzania, United Republic of", "TZ"),
    ("Syrian Arab Republic", "SY"),
    ("Lao People's Democratic Republic", "LA"),
    ("Moldova (the Republic of)", "MD"),
    ("Brunei Darussalam", "BN"),
    ("Palestine", "PS"),
    ("Vatican City", "VA"),
];

/// Resolve a country by English name, ignoring case and surrounding whitespace.
pub fn lookup_by_name(name: &str) -> Option<Country> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    COUNTRIES
        .iter()
        .find(|country| country.name.eq_ignore_ascii_case(name))
        .copied()
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                .and_then(|(_, code)| lookup_by_code(code))
        })
}

pub fn lookup_by_code(code: &str) -> Option<Country> {
    COUNTRIES
        .iter()
        .find(|country| country.code.eq_ignore_ascii_case(code.trim()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn resolves_names_case_insensitively() {
        assert_eq!(lookup_by_name("Pakistan").map(|c| c.code), Some("PK"));
        assert_eq!(lookup_by_name("  united states of america ").map(|c| c.code), Some("US"));
        assert_eq!(lookup_by_name("Côte d'Ivoire").map(|c| c.code), Some("CI"));
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(lookup_by_name("USA").map(|c| c.code), Some("US"));
        assert_eq!(lookup_by_name("Viet Nam").map(|c| c.code), Some("VN"));
    }

    #[test]
    fn unknown_or_blank_names_miss() {
        assert_eq!(lookup_by_name("Atlantis"), None);
        assert_eq!(lookup_by_name(""), None);
        assert_eq!(lookup_by_name("PK"), None);
    }

    #[test]
    fn codes_and_aliases_are_consistent() {
        let codes: HashSet<&str> = COUNTRIES.iter().map(|c| c.code).collect();
        assert_eq!(codes.len(), COUNTRIES.len());
        for (alias, code) in ALIASES {
            assert!(codes.contains(code), "alias {alias} points at unknown code {code}");
        }
    }
}
