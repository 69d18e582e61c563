//! Static Dutch-language lexicons used by the entity linker.
//!
//! The tables cover personal titles, role words with their DBpedia/schema.org
//! type names, the coarse entity-type taxonomy, topical subject vocabulary,
//! month names, and a stop-word list. All lookups expect normalized
//! (lowercase, diacritic-free) input.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Dutch month names, used for date detection.
pub static MONTHS: &[&str] = &[
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

/// Personal titles and honorifics that may precede a person name.
pub static TITLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "heer",
        "hr",
        "dhr",
        "meneer",
        "mevrouw",
        "mevr",
        "mw",
        "mej",
        "mejuffrouw",
        "mr",
        "dr",
        "drs",
        "prof",
        "professor",
        "ir",
        "ing",
        "ds",
        "jhr",
        "jkvr",
        "wed",
    ]
    .into_iter()
    .collect()
});

/// High-frequency words excluded from context windows and keyword matching.
pub static UNWANTED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "aangezien",
        "afgelopen",
        "aldus",
        "allen",
        "altijd",
        "andere",
        "anderen",
        "beide",
        "bijna",
        "binnen",
        "boven",
        "buiten",
        "daarna",
        "daarom",
        "dezelfde",
        "echter",
        "eerste",
        "enige",
        "enkele",
        "evenals",
        "geheel",
        "gisteren",
        "grote",
        "heden",
        "hierbij",
        "hoewel",
        "iedere",
        "immers",
        "kunnen",
        "laatste",
        "moeten",
        "nadat",
        "nieuwe",
        "omdat",
        "onder",
        "ongeveer",
        "reeds",
        "sedert",
        "sinds",
        "slechts",
        "steeds",
        "tegen",
        "terwijl",
        "tijdens",
        "tussen",
        "vandaag",
        "velen",
        "verder",
        "vervolgens",
        "volgens",
        "voordat",
        "waarbij",
        "waarin",
        "waarop",
        "wegens",
        "werden",
        "worden",
        "zullen",
        "zouden",
    ]
    .into_iter()
    .collect()
});

/// How to read adjacent type-name literals in the upstream vocabulary that
/// can be parsed either as one fused name or as two separate entries.
///
/// The trained ranking models saw the fused form, so that is the default;
/// `Split` is available for retrained models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaCompat {
    #[default]
    Fused,
    Split,
}

/// A pair of adjacent type-name literals with an ambiguous reading.
#[derive(Debug, Clone, Copy)]
pub struct AmbiguousTypeName {
    pub fused: &'static str,
    pub parts: [&'static str; 2],
}

/// A role word class: surface words, the KB type names they imply, the
/// subjects they belong to, and the coarse entity types they map to.
#[derive(Debug)]
pub struct Role {
    pub name: &'static str,
    pub words: &'static [&'static str],
    schema_types: &'static [&'static str],
    ambiguous_schema_types: &'static [AmbiguousTypeName],
    pub subjects: &'static [&'static str],
    pub entity_types: &'static [&'static str],
}

impl Role {
    /// KB type names for this role under the given compatibility reading.
    pub fn schema_types(&self, compat: SchemaCompat) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.schema_types.to_vec();
        for a in self.ambiguous_schema_types {
            match compat {
                SchemaCompat::Fused => out.push(a.fused),
                SchemaCompat::Split => out.extend(a.parts),
            }
        }
        out
    }

    /// Whether the role maps to exactly one coarse entity type.
    pub fn unique_entity_type(&self) -> Option<&'static str> {
        match self.entity_types {
            [t] => Some(t),
            _ => None,
        }
    }
}

pub static ROLES: &[Role] = &[
    // Persons
    Role {
        name: "politician",
        words: &[
            "minister",
            "premier",
            "kamerlid",
            "partijleider",
            "burgemeester",
            "staatssecretaris",
            "president",
            "wethouder",
            "consul",
            "ambassadeur",
            "gemeenteraadslid",
            "fractieleider",
            "politicus",
        ],
        schema_types: &[
            "Politician",
            "OfficeHolder",
            "Judge",
            "MemberOfParliament",
            "President",
            "PrimeMinister",
            "Governor",
            "Congressman",
            "Mayor",
        ],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &["person"],
    },
    Role {
        name: "royalty",
        words: &[
            "keizer",
            "koning",
            "koningin",
            "vorst",
            "prins",
            "prinses",
            "kroonprins",
            "kroonprinses",
            "majesteit",
        ],
        schema_types: &["Royalty", "Monarch", "Noble"],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &["person"],
    },
    Role {
        name: "military_person",
        words: &[
            "generaal",
            "gen",
            "majoor",
            "maj",
            "luitenant",
            "kolonel",
            "kol",
            "kapitein",
            "bevelhebber",
        ],
        schema_types: &["MilitaryPerson"],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &["person"],
    },
    Role {
        name: "sports_person",
        words: &[
            "atleet",
            "sportman",
            "sportvrouw",
            "sporter",
            "wielrenner",
            "voetballer",
            "tennisser",
            "zwemmer",
            "spits",
            "keeper",
            "scheidsrechter",
        ],
        schema_types: &[
            "Athlete",
            "SoccerPlayer",
            "Cyclist",
            "SoccerManager",
            "TennisPlayer",
            "Swimmer",
            "Boxer",
            "Wrestler",
            "Speedskater",
            "Skier",
            "WinterSportPlayer",
            "GolfPlayer",
            "RacingDriver",
            "MotorsportRacer",
            "Canoist",
            "Cricketer",
            "RugbyPlayer",
            "HorseRider",
            "AmericanFootballPlayer",
            "Rower",
            "MotorcycleRider",
            "Skater",
            "BaseballPlayer",
            "BasketballPlayer",
            "Gymnast",
            "SportsManager",
            "IceHockeyPlayer",
            "FigureSkater",
            "HandballPlayer",
        ],
        ambiguous_schema_types: &[],
        subjects: &["sports"],
        entity_types: &["person"],
    },
    Role {
        name: "performing_artist",
        words: &["acteur", "toneelspeler", "filmregisseur", "regisseur", "actrice"],
        schema_types: &["Actor", "VoiceActor", "Presenter", "Comedian"],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &["person"],
    },
    Role {
        name: "musical_artist",
        words: &[
            "musicus",
            "componist",
            "zanger",
            "zangeres",
            "trompetspeler",
            "orkestleider",
        ],
        schema_types: &["MusicalArtist", "ClassicalMusicArtist"],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &["person"],
    },
    Role {
        name: "visual_artist",
        words: &[
            "kunstenaar",
            "schilder",
            "beeldhouwer",
            "architect",
            "fotograaf",
            "ontwerper",
        ],
        schema_types: &["Painter", "Architect", "Photographer", "FashionDesigner"],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &["person"],
    },
    Role {
        name: "writer",
        words: &["auteur", "schrijver", "dichter", "journalist"],
        schema_types: &["Writer", "Journalist", "Screenwriter", "Poet"],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &["person"],
    },
    Role {
        name: "business_person",
        words: &["manager", "teamleider", "directeur", "bedrijfsleider", "ondernemer"],
        schema_types: &[],
        ambiguous_schema_types: &[],
        subjects: &["business"],
        entity_types: &["person"],
    },
    Role {
        name: "scientist",
        words: &[
            "prof",
            "professor",
            "dr",
            "ingenieur",
            "ir",
            "natuurkundige",
            "scheikundige",
            "wiskundige",
            "bioloog",
            "historicus",
            "onderzoeker",
            "drs",
            "ing",
            "wetenschapper",
        ],
        schema_types: &["Scientist"],
        ambiguous_schema_types: &[],
        subjects: &["science"],
        entity_types: &["person"],
    },
    Role {
        name: "religious_person",
        words: &[
            "dominee",
            "paus",
            "kardinaal",
            "aartsbisschop",
            "bisschop",
            "monseigneur",
            "mgr",
            "kapelaan",
            "deken",
            "abt",
            "prior",
            "pastoor",
            "pater",
            "predikant",
            "opperrabbijn",
            "rabbijn",
            "imam",
            "geestelijke",
            "frater",
        ],
        schema_types: &["ChristianBishop", "Cardinal", "Cleric", "Saint", "Pope"],
        ambiguous_schema_types: &[],
        subjects: &["religion"],
        entity_types: &["person"],
    },
    // Locations
    Role {
        name: "settlement",
        words: &[
            "gemeente",
            "provincie",
            "stad",
            "dorp",
            "regio",
            "wijk",
            "gebied",
            "stadsdeel",
            "waterschap",
            "straat",
        ],
        schema_types: &[
            "Settlement",
            "Village",
            "Municipality",
            "Town",
            "AdministrativeRegion",
            "City",
            "HistoricPlace",
            "PopulatedPlace",
            "ProtectedArea",
            "CityDistrict",
            "Country",
            "SubMunicipality",
        ],
        ambiguous_schema_types: &[AmbiguousTypeName {
            fused: "StreetDistrict",
            parts: ["Street", "District"],
        }],
        subjects: &[],
        entity_types: &["location"],
    },
    Role {
        name: "infrastructure",
        words: &["station", "metrostation", "vliegveld", "gebouw", "brug", "monument"],
        schema_types: &[
            "Building",
            "Road",
            "Station",
            "RailwayStation",
            "Airport",
            "HistoricBuilding",
            "Bridge",
            "Dam",
            "ArchitecturalStructure",
            "Monument",
            "Castle",
            "WorldHeritageSite",
            "MetroStation",
        ],
        ambiguous_schema_types: &[],
        subjects: &[],
        entity_types: &["location"],
    },
    Role {
        name: "natural_location",
        words: &["rivier", "gebergte", "meer", "planeet", "eiland"],
        schema_types: &[
            "River",
            "Mountain",
            "Lake",
            "CelestialBody",
            "Asteroid",
            "Planet",
            "Island",
            "MountainRange",
            "BodyOfWater",
            "MountainPass",
        ],
        ambiguous_schema_types: &[],
        subjects: &[],
        entity_types: &["location"],
    },
    Role {
        name: "sports_location",
        words: &["stadion", "arena"],
        schema_types: &["Stadium", "Arena"],
        ambiguous_schema_types: &[],
        subjects: &["sports"],
        entity_types: &["location"],
    },
    Role {
        name: "religious_location",
        words: &["bisdom", "kerk", "kathedraal", "tempel", "kapel", "heiligdom"],
        schema_types: &["Church", "ReligiousBuilding", "Diocese"],
        ambiguous_schema_types: &[],
        subjects: &["religion"],
        entity_types: &["location", "organisation"],
    },
    // Organizations
    Role {
        name: "company",
        words: &[
            "bedrijf",
            "bank",
            "luchtvaartmaatschappij",
            "onderneming",
            "hotel",
        ],
        schema_types: &["Company", "Bank", "Airline", "Hotel"],
        ambiguous_schema_types: &[],
        subjects: &["business"],
        entity_types: &["organisation"],
    },
    Role {
        name: "school",
        words: &[
            "basisschool",
            "school",
            "hogeschool",
            "universiteit",
            "onderzoeksinstituut",
            "faculteit",
        ],
        schema_types: &["School", "University"],
        ambiguous_schema_types: &[],
        subjects: &["science"],
        entity_types: &["organisation", "location"],
    },
    Role {
        name: "political_organisation",
        words: &["partij"],
        schema_types: &["PoliticalParty", "GovernmentAgency"],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &["organisation"],
    },
    Role {
        name: "sports_organisation",
        words: &["club", "voetbalclub"],
        schema_types: &["SoccerClub", "RugbyClub", "SportsTeam", "SoccerLeague", "HockeyTeam"],
        ambiguous_schema_types: &[],
        subjects: &["sports"],
        entity_types: &["organisation"],
    },
    Role {
        name: "cultural_organisation",
        words: &["museum", "band", "rockband", "popgroep", "orkest"],
        schema_types: &["Band", "MusicGroup", "RecordLabel", "Museum"],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &["organisation"],
    },
    Role {
        name: "military_organisation",
        words: &[],
        schema_types: &["MilitaryUnit"],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &["organisation"],
    },
    Role {
        name: "media_organisation",
        words: &["krant", "tijdschrift", "zender", "televisiezender", "radiozender"],
        schema_types: &[
            "Newspaper",
            "Magazine",
            "RadioStation",
            "Publisher",
            "TelevisionStation",
            "AcademicJournal",
            "PeriodicalLiterature",
        ],
        ambiguous_schema_types: &[],
        subjects: &[],
        entity_types: &[],
    },
    // Other
    Role {
        name: "creative_work",
        words: &[
            "film",
            "album",
            "plaat",
            "nummer",
            "single",
            "boek",
            "roman",
            "novelle",
            "bundel",
            "dichtbundel",
            "script",
            "serie",
            "televisieserie",
            "opera",
            "toneelstuk",
            "gedicht",
            "schilderij",
            "beeld",
        ],
        schema_types: &[
            "CreativeWork",
            "Film",
            "Album",
            "Single",
            "Book",
            "TelevisionShow",
            "TelevisionEpisode",
            "Song",
            "MusicalWork",
            "ArtWork",
            "WrittenWork",
            "Play",
        ],
        ambiguous_schema_types: &[],
        subjects: &["culture"],
        entity_types: &[],
    },
    Role {
        name: "product",
        words: &[],
        schema_types: &["Product"],
        ambiguous_schema_types: &[],
        subjects: &["business"],
        entity_types: &[],
    },
    Role {
        name: "ship",
        words: &[
            "ss",
            "stoomschip",
            "passagiersschip",
            "cruiseschip",
            "schip",
            "vlaggeschip",
            "zeilschip",
            "jacht",
        ],
        schema_types: &["Ship"],
        ambiguous_schema_types: &[],
        subjects: &["business"],
        entity_types: &[],
    },
    Role {
        name: "sports_event",
        words: &["wedstrijd"],
        schema_types: &[
            "OlympicEvent",
            "SoccerTournament",
            "FootballMatch",
            "CyclingRace",
            "SportsEvent",
        ],
        ambiguous_schema_types: &[AmbiguousTypeName {
            fused: "GrandPrixTennisTournament",
            parts: ["GrandPrix", "TennisTournament"],
        }],
        subjects: &["sports"],
        entity_types: &[],
    },
    Role {
        name: "military_event",
        words: &["oorlog", "conflict"],
        schema_types: &["MilitaryConflict"],
        ambiguous_schema_types: &[],
        subjects: &["politics"],
        entity_types: &[],
    },
];

/// One coarse entity type with the KB type names that realise it and cue
/// words that signal it in running text.
#[derive(Debug)]
pub struct TypeEntry {
    pub name: &'static str,
    pub schema_types: &'static [&'static str],
    pub words: &'static [&'static str],
}

pub static TYPES: &[TypeEntry] = &[
    TypeEntry {
        name: "person",
        schema_types: &["Person", "Agent"],
        words: &["geboren", "overleden", "zoon", "dochter", "echtgenoot", "echtgenote"],
    },
    TypeEntry {
        name: "location",
        schema_types: &["Place", "Location"],
        words: &["gelegen", "hoofdstad", "inwoners", "grondgebied", "streek"],
    },
    TypeEntry {
        name: "organisation",
        schema_types: &["Organization", "Organisation"],
        words: &["opgericht", "organisatie", "vereniging", "instelling", "genootschap"],
    },
];

/// A topical subject with its detection vocabulary.
#[derive(Debug)]
pub struct Subject {
    pub name: &'static str,
    pub words: &'static [&'static str],
}

pub static SUBJECTS: &[Subject] = &[
    Subject {
        name: "politics",
        words: &[
            "regering",
            "kabinet",
            "fractie",
            "tweede kamer",
            "eerste kamer",
            "politiek",
            "vorstenhuis",
            "koningshuis",
            "koninklijk huis",
            "troon",
            "rijk",
            "keizerrijk",
            "monarchie",
            "leger",
            "oorlog",
            "troepen",
            "strijdkrachten",
        ],
    },
    Subject {
        name: "sports",
        words: &["sport", "voetbal", "wielersport", "speler", "spelers"],
    },
    Subject {
        name: "culture",
        words: &[
            "kunst",
            "cultuur",
            "muziek",
            "toneel",
            "theater",
            "cinema",
            "romans",
            "verhalen",
            "schrijvers",
        ],
    },
    Subject {
        name: "business",
        words: &[
            "economie",
            "beurs",
            "aandelen",
            "bedrijfsleven",
            "management",
            "werknemer",
            "werknemers",
            "salaris",
            "staking",
            "personeel",
        ],
    },
    Subject {
        name: "science",
        words: &["wetenschap", "studie", "onderzoek", "uitvinding", "ontdekking"],
    },
    Subject {
        name: "religion",
        words: &["geloof", "religie"],
    },
];

/// Whether a normalized word is a personal title.
pub fn is_title(word: &str) -> bool {
    TITLES.contains(word)
}

/// First role (in table order) whose word list contains the given word.
pub fn role_for_word(word: &str) -> Option<&'static Role> {
    ROLES.iter().find(|r| r.words.contains(&word))
}

pub fn role_by_name(name: &str) -> Option<&'static Role> {
    ROLES.iter().find(|r| r.name == name)
}

pub fn type_by_name(name: &str) -> Option<&'static TypeEntry> {
    TYPES.iter().find(|t| t.name == name)
}

pub fn subject_by_name(name: &str) -> Option<&'static Subject> {
    SUBJECTS.iter().find(|s| s.name == name)
}

/// Detection vocabulary for a subject: its own words plus the words of every
/// role that lists the subject.
pub fn subject_vocabulary(subject: &Subject) -> Vec<&'static str> {
    let mut words: Vec<&'static str> = subject.words.to_vec();
    for role in ROLES {
        if role.subjects.contains(&subject.name) {
            words.extend(role.words);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_contain_honorifics() {
        assert!(is_title("dr"));
        assert!(is_title("mevrouw"));
        assert!(!is_title("fiets"));
    }

    #[test]
    fn role_lookup_prefers_table_order() {
        // "prof" appears only under scientist
        assert_eq!(role_for_word("prof").unwrap().name, "scientist");
        // "minister" is a politician word
        assert_eq!(role_for_word("minister").unwrap().name, "politician");
        assert!(role_for_word("onbekendwoord").is_none());
    }

    #[test]
    fn unique_entity_type() {
        assert_eq!(
            role_by_name("politician").unwrap().unique_entity_type(),
            Some("person")
        );
        // religious_location maps to two types
        assert_eq!(role_by_name("religious_location").unwrap().unique_entity_type(), None);
    }

    #[test]
    fn schema_compat_controls_ambiguous_names() {
        let settlement = role_by_name("settlement").unwrap();
        let fused = settlement.schema_types(SchemaCompat::Fused);
        assert!(fused.contains(&"StreetDistrict"));
        assert!(!fused.contains(&"Street"));

        let split = settlement.schema_types(SchemaCompat::Split);
        assert!(split.contains(&"Street"));
        assert!(split.contains(&"District"));
        assert!(!split.contains(&"StreetDistrict"));
    }

    #[test]
    fn subject_vocabulary_includes_role_words() {
        let politics = subject_by_name("politics").unwrap();
        let vocab = subject_vocabulary(politics);
        // Own words
        assert!(vocab.contains(&"regering"));
        // Role words from roles listing the subject
        assert!(vocab.contains(&"minister"));
        assert!(vocab.contains(&"koning"));
        // Not from unrelated roles
        assert!(!vocab.contains(&"voetballer"));
    }
}
