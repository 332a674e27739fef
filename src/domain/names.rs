//! Display name generation for anonymous sessions.
//!
//! Names are an adjective followed by a notable scientist's surname, both
//! capitalized, e.g. "Brave Curie".

use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "admiring", "adoring", "agitated", "amazing", "angry", "awesome", "blissful", "bold",
    "boring", "brave", "charming", "clever", "cool", "compassionate", "competent", "confident",
    "cranky", "dazzling", "determined", "distracted", "dreamy", "eager", "ecstatic", "elastic",
    "elated", "elegant", "eloquent", "epic", "fervent", "festive", "flamboyant", "focused",
    "friendly", "frosty", "gallant", "gifted", "goofy", "gracious", "happy", "hardcore",
    "heuristic", "hopeful", "hungry", "infallible", "inspiring", "jolly", "jovial", "keen",
    "kind", "laughing", "loving", "lucid", "magical", "modest", "musing", "mystifying",
    "naughty", "nervous", "nifty", "nostalgic", "objective", "optimistic", "peaceful",
    "pedantic", "pensive", "practical", "priceless", "quirky", "quizzical", "relaxed",
    "reverent", "romantic", "sad", "serene", "sharp", "silly", "sleepy", "stoic", "stupefied",
    "suspicious", "sweet", "tender", "thirsty", "trusting", "unruffled", "upbeat", "vibrant",
    "vigilant", "vigorous", "wizardly", "wonderful", "xenodochial", "youthful", "zealous",
    "zen",
];

const SURNAMES: &[&str] = &[
    "albattani", "allen", "archimedes", "babbage", "banach", "bardeen", "bartik", "bell",
    "bhabha", "blackwell", "bohr", "booth", "borg", "bose", "boyd", "brahmagupta", "brattain",
    "brown", "carson", "cerf", "chandrasekhar", "clarke", "colden", "cori", "curie", "darwin",
    "davinci", "dijkstra", "easley", "einstein", "elion", "engelbart", "euclid", "euler",
    "fermat", "fermi", "feynman", "franklin", "galileo", "gates", "goldberg", "goldstine",
    "goodall", "hamilton", "hawking", "heisenberg", "hermann", "hodgkin", "hoover", "hopper",
    "hugle", "hypatia", "jang", "jennings", "johnson", "joliot", "kalam", "keller", "kepler",
    "khorana", "kilby", "knuth", "kowalevski", "lalande", "lamarr", "leakey", "leavitt",
    "lovelace", "lumiere", "mayer", "mccarthy", "mcclintock", "meitner", "mendel", "mirzakhani",
    "morse", "newton", "nobel", "noether", "northcutt", "noyce", "panini", "pare", "pasteur",
    "payne", "perlman", "pike", "poincare", "ptolemy", "raman", "ritchie", "rosalind",
    "sammet", "shannon", "shockley", "sinoussi", "snyder", "spence", "stallman", "swartz",
    "tesla", "thompson", "torvalds", "turing", "varahamihira", "visvesvaraya", "wescoff",
    "williams", "wilson", "wing", "wozniak", "wright", "yalow", "yonath",
];

/// Uppercase the first character of a word, leaving the rest untouched.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Generate a random two-word display name.
pub fn generate() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("anonymous");
    let surname = SURNAMES.choose(&mut rng).copied().unwrap_or("user");
    format!("{} {}", capitalize(adjective), capitalize(surname))
}
