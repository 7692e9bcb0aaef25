// Stellar nomenclature tables
//
// Bayer/Flamsteed designations show up in source catalogs spelled out
// ("Kappa Andromedae", "alpha Cen", "p Eri"). These tables map the Greek
// letters and Latin genitives onto the abbreviations the name resolver
// knows ("kap And", "alf Cen", "pi Eri").

/// Spelled-out or capitalized Greek letters -> resolver abbreviation
pub(crate) const GREEK_LETTERS: &[(&str, &str)] = &[
    ("alfa", "alf"),
    ("alpha", "alf"),
    ("beta", "bet"),
    ("gamma", "gam"),
    ("delta", "del"),
    ("epsilon", "eps"),
    ("zeta", "zet"),
    ("teta", "tet"),
    ("theta", "tet"),
    ("iota", "iot"),
    ("kappa", "kap"),
    ("lambda", "lam"),
    ("mu", "miu"),
    ("nu", "niu"),
    ("xi", "ksi"),
    ("omicron", "omi"),
    ("sigma", "sig"),
    ("upsilon", "ups"),
    ("chi", "khi"),
    ("omega", "ome"),
    ("p", "pi"),
    ("Alfa", "alf"),
    ("Alpha", "alf"),
    ("Beta", "bet"),
    ("Bet", "bet"),
    ("Gamma", "gam"),
    ("Gam", "gam"),
    ("Delta", "del"),
    ("Del", "del"),
    ("Epsilon", "eps"),
    ("Eps", "eps"),
    ("Zeta", "zet"),
    ("Zet", "zet"),
    ("Eta", "eta"),
    ("Teta", "tet"),
    ("Theta", "tet"),
    ("Iota", "iot"),
    ("Iot", "iot"),
    ("Kappa", "kap"),
    ("Kap", "kap"),
    ("Lambda", "lam"),
    ("Lam", "lam"),
    ("Mu", "miu"),
    ("Miu", "miu"),
    ("Nu", "niu"),
    ("Niu", "niu"),
    ("Xi", "ksi"),
    ("Ksi", "ksi"),
    ("Omicron", "omi"),
    ("Omi", "omi"),
    ("Pi", "pi"),
    ("Rho", "rho"),
    ("Sigma", "sig"),
    ("Sig", "sig"),
    ("Upsilon", "ups"),
    ("Ups", "ups"),
    ("Phi", "phi"),
    ("Chi", "khi"),
    ("Khi", "khi"),
    ("Psi", "psi"),
    ("Omega", "ome"),
    ("Ome", "ome"),
];

/// Latin genitive constellation names (and common misspellings) -> IAU abbreviation
///
/// Two-word genitives are matched before one-word ones.
pub(crate) const CONSTELLATION_GENITIVES: &[(&str, &str)] = &[
    ("Canum Venaticorum", "CVn"),
    ("Canis Majoris", "CMa"),
    ("Canis Minoris", "CMi"),
    ("Comae Berenices", "Com"),
    ("Coronae Australis", "CrA"),
    ("Coronae Borealis", "CrB"),
    ("Leonis Minoris", "LMi"),
    ("Piscis Austrini", "PsA"),
    ("Trianguli Australis", "TrA"),
    ("Ursae Majoris", "UMa"),
    ("Ursae Minoris", "UMi"),
    ("Andromedae", "And"),
    ("Antliae", "Ant"),
    ("Apodis", "Aps"),
    ("Aquarii", "Aqr"),
    ("Aquilae", "Aql"),
    ("Arae", "Ara"),
    ("Arietis", "Ari"),
    ("Aurigae", "Aur"),
    ("Bootis", "Boo"),
    ("Caeli", "Cae"),
    ("Camelopardalis", "Cam"),
    ("Cancri", "Cnc"),
    ("Capricorni", "Cap"),
    ("Carinae", "Car"),
    ("Cassiopeiae", "Cas"),
    ("Centauri", "Cen"),
    ("Cephei", "Cep"),
    ("Cepi", "Cep"),
    ("Ceti", "Cet"),
    ("Chamaeleontis", "Cha"),
    ("Circini", "Cir"),
    ("Columbae", "Col"),
    ("Corvi", "Crv"),
    ("Crateris", "Crt"),
    ("Crucis", "Cru"),
    ("Cygni", "Cyg"),
    ("Delphini", "Del"),
    ("Doradus", "Dor"),
    ("Draconis", "Dra"),
    ("Equulei", "Equ"),
    ("Eridani", "Eri"),
    ("Fornacis", "For"),
    ("Geminorum", "Gem"),
    ("Gruis", "Gru"),
    ("Herculis", "Her"),
    ("Horologii", "Hor"),
    ("Hydrae", "Hya"),
    ("Hydri", "Hyi"),
    ("Indi", "Ind"),
    ("Lacertae", "Lac"),
    ("Leonis", "Leo"),
    ("Leporis", "Lep"),
    ("Librae", "Lib"),
    ("Lupi", "Lup"),
    ("Lyncis", "Lyn"),
    ("Lyrae", "Lyr"),
    ("Mensae", "Men"),
    ("Microscopii", "Mic"),
    ("Monocerotis", "Mon"),
    ("Muscae", "Mus"),
    ("Normae", "Nor"),
    ("Octantis", "Oct"),
    ("Ophiuchi", "Oph"),
    ("Orionis", "Ori"),
    ("Pavonis", "Pav"),
    ("Pegasi", "Peg"),
    ("Persei", "Per"),
    ("Phoenicis", "Phe"),
    ("Pictoris", "Pic"),
    ("Piscium", "Psc"),
    ("Puppis", "Pup"),
    ("Pyxidis", "Pyx"),
    ("Reticuli", "Ret"),
    ("Sagittae", "Sge"),
    ("Sagittarii", "Sgr"),
    ("Scorpii", "Sco"),
    ("Sculptoris", "Scl"),
    ("Scuti", "Sct"),
    ("Serpentis", "Ser"),
    ("Sextantis", "Sex"),
    ("Tauri", "Tau"),
    ("Telescopii", "Tel"),
    ("Trianguli", "Tri"),
    ("Tucanae", "Tuc"),
    ("Uma", "UMa"),
    ("Umi", "UMi"),
    ("Velorum", "Vel"),
    ("Virginis", "Vir"),
    ("Volantis", "Vol"),
    ("Vulpeculae", "Vul"),
];

/// The 88 IAU constellation abbreviations
pub(crate) const IAU_ABBREVIATIONS: &[&str] = &[
    "And", "Ant", "Aps", "Aqr", "Aql", "Ara", "Ari", "Aur", "Boo", "Cae", "Cam", "Cnc", "CVn",
    "CMa", "CMi", "Cap", "Car", "Cas", "Cen", "Cep", "Cet", "Cha", "Cir", "Col", "Com", "CrA",
    "CrB", "Crv", "Crt", "Cru", "Cyg", "Del", "Dor", "Dra", "Equ", "Eri", "For", "Gem", "Gru",
    "Her", "Hor", "Hya", "Hyi", "Ind", "Lac", "Leo", "LMi", "Lep", "Lib", "Lup", "Lyn", "Lyr",
    "Men", "Mic", "Mon", "Mus", "Nor", "Oct", "Oph", "Ori", "Pav", "Peg", "Per", "Phe", "Pic",
    "Psc", "PsA", "Pup", "Pyx", "Ret", "Sge", "Sgr", "Sco", "Scl", "Sct", "Ser", "Sex", "Tau",
    "Tel", "Tri", "TrA", "Tuc", "UMa", "UMi", "Vel", "Vir", "Vol", "Vul",
];

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub(crate) fn is_constellation_abbreviation(token: &str) -> bool {
    IAU_ABBREVIATIONS.contains(&token)
}

/// Whole-token constellation substitution on a whitespace-collapsed name
///
/// Genitives are always rewritten. A Greek letter is rewritten only when it
/// precedes a constellation, optionally with a superscript-style index in
/// between ("mu 2 Sco"), so survey prefixes that happen to spell a Greek
/// letter are left alone.
pub(crate) fn substitute_constellation_tokens(name: &str) -> String {
    let tokens: Vec<&str> = name.split(' ').collect();

    // Pass 1: genitives, two-word forms first
    let mut rewritten: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len() {
            let pair = format!("{} {}", tokens[i], tokens[i + 1]);
            if let Some(abbr) = lookup(CONSTELLATION_GENITIVES, &pair) {
                rewritten.push(abbr.to_string());
                i += 2;
                continue;
            }
        }
        match lookup(CONSTELLATION_GENITIVES, tokens[i]) {
            Some(abbr) => rewritten.push(abbr.to_string()),
            None => rewritten.push(tokens[i].to_string()),
        }
        i += 1;
    }

    // Pass 2: Greek letters in front of a constellation
    for i in 0..rewritten.len() {
        let Some(abbr) = lookup(GREEK_LETTERS, &rewritten[i]) else {
            continue;
        };
        let next = rewritten.get(i + 1).map(String::as_str);
        let after = rewritten.get(i + 2).map(String::as_str);
        let precedes_constellation = match (next, after) {
            (Some(n), _) if is_constellation_abbreviation(n) => true,
            (Some(n), Some(a)) => {
                n.chars().all(|c| c.is_ascii_digit()) && is_constellation_abbreviation(a)
            }
            _ => false,
        };
        if precedes_constellation {
            rewritten[i] = abbr.to_string();
        }
    }

    rewritten.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(IAU_ABBREVIATIONS.len(), 88);
        assert!(GREEK_LETTERS.len() + CONSTELLATION_GENITIVES.len() > 140);
    }

    #[test]
    fn test_every_genitive_maps_to_iau_abbreviation() {
        for (_, abbr) in CONSTELLATION_GENITIVES {
            assert!(is_constellation_abbreviation(abbr), "{} not IAU", abbr);
        }
    }

    #[test]
    fn test_bayer_designations() {
        assert_eq!(substitute_constellation_tokens("Kappa Andromedae"), "kap And");
        assert_eq!(substitute_constellation_tokens("alpha Cen"), "alf Cen");
        assert_eq!(substitute_constellation_tokens("tau Bootis"), "tau Boo");
        assert_eq!(substitute_constellation_tokens("p Eri"), "pi Eri");
        assert_eq!(substitute_constellation_tokens("mu 2 Scorpii"), "miu 2 Sco");
    }

    #[test]
    fn test_two_word_genitives() {
        assert_eq!(substitute_constellation_tokens("47 Ursae Majoris"), "47 UMa");
        assert_eq!(substitute_constellation_tokens("11 Leonis Minoris"), "11 LMi");
        assert_eq!(substitute_constellation_tokens("HD 1 Leonis"), "HD 1 Leo");
    }

    #[test]
    fn test_greek_without_constellation_untouched() {
        assert_eq!(substitute_constellation_tokens("Xi 1"), "Xi 1");
        assert_eq!(substitute_constellation_tokens("Beta Pic"), "bet Pic");
        assert_eq!(substitute_constellation_tokens("Kepler-22"), "Kepler-22");
    }
}
