//! The catalog a group starts with before anyone edits it.

use std::collections::BTreeMap;

use crate::catalog::EntityCatalog;
use crate::types::{EntityConfig, SpawnRule, TrackerResult};

struct Seed {
    name: &'static str,
    aliases: &'static [&'static str],
    /// (location, min, max, copies). Copies above one expand to `location[1]`..
    spawns: &'static [(&'static str, u32, u32, u32)],
}

const fn seed(
    name: &'static str,
    aliases: &'static [&'static str],
    spawns: &'static [(&'static str, u32, u32, u32)],
) -> Seed {
    Seed {
        name,
        aliases,
        spawns,
    }
}

static SEEDS: &[Seed] = &[
    seed("Amon Ra", &[], &[("Pyramid", 60, 70, 1)]),
    seed(
        "Atroce",
        &[],
        &[
            ("Rachel Field 2", 240, 250, 1),
            ("Rachel Field 3", 180, 190, 1),
            ("Rachel Field 4", 300, 310, 1),
            ("Veins Field 1", 180, 190, 1),
            ("Veins Field 2", 360, 370, 1),
            ("Valkyrie", 480, 490, 1),
        ],
    ),
    seed("Bacsojin", &["white_lady"], &[("Louyang", 117, 127, 1)]),
    seed("Baphomet", &[], &[("Hidden", 120, 130, 1)]),
    seed("Beelzebub", &[], &[("Abbey", 720, 730, 1)]),
    seed("Bio 3 MVP", &[], &[("Bio", 100, 130, 1)]),
    seed("Bio 4 MVP", &[], &[("Bio", 100, 130, 1)]),
    seed("Boitata", &[], &[("Brasilis", 120, 130, 1)]),
    seed("Daehyon", &[], &[("Hall of the Abyss", 480, 490, 1)]),
    seed(
        "Dark Lord",
        &[],
        &[
            ("Glast Heim", 60, 70, 1),
            ("Britoniah 1", 480, 490, 1),
            ("Britoniah 2", 480, 490, 1),
        ],
    ),
    seed("Detale", &["detardeurus"], &[("Abyss", 180, 190, 1)]),
    seed("Doppelganger", &[], &[("Geffen", 120, 130, 1), ("Luina", 480, 490, 1)]),
    seed("Dracula", &[], &[("Geffen", 60, 70, 1)]),
    seed("Drake", &[], &[("Sunken Ship", 120, 130, 1)]),
    seed(
        "Eddga",
        &[],
        &[
            ("Payon Field", 120, 130, 1),
            ("Greenwood", 480, 490, 1),
            ("Greenwood 2", 480, 490, 1),
        ],
    ),
    seed("Egnigem Cenia", &[], &[("Bio Labs 2", 120, 130, 1)]),
    seed("Evil Snake Lord", &[], &[("Gonryun", 94, 104, 1)]),
    seed("Fallen Bishop Hibram", &[], &[("Abbey", 120, 130, 1)]),
    seed("Garm", &["hatii"], &[("Lutie Field", 120, 130, 1)]),
    seed("Gioia", &[], &[("Hall of the Abyss", 480, 490, 1)]),
    seed("Gloom Under Night", &[], &[("Rachel", 300, 310, 1)]),
    seed("Gold Queen Scaraba", &[], &[("Skarava", 120, 120, 1)]),
    seed("Golden Thief Bug", &[], &[("Culverts", 60, 70, 1)]),
    seed("Gopinich", &[], &[("Moscovia", 120, 130, 1)]),
    seed("Hardrock Mammoth", &[], &[("Manuk", 240, 240, 1)]),
    seed("Ifrit", &[], &[("Thor", 660, 670, 1)]),
    seed("Incantation Samurai", &[], &[("Amatsu", 91, 101, 1)]),
    seed("Kades", &["dark_guardian_kades"], &[("Hall of the Abyss", 480, 490, 1)]),
    seed("Kiel D-01", &[], &[("Kiel", 120, 180, 1)]),
    seed("Kraken", &[], &[("Byalan", 120, 150, 1)]),
    seed("Lady Tanee", &[], &[("Ayothaya", 420, 430, 1)]),
    seed("Leak", &[], &[("Dewata", 120, 120, 1)]),
    seed("Lord of Death", &[], &[("Nifflheim", 133, 133, 1)]),
    seed("Maya", &[], &[("Anthell", 120, 130, 1)]),
    seed("Mistress", &["missy"], &[("Mjolnir Field", 120, 130, 1)]),
    seed("Moonlight Flower", &["moony"], &[("Payon", 60, 70, 1)]),
    seed("Nightmare Amon Ra", &[], &[("Nightmare Pyramid", 60, 70, 1)]),
    seed("Orc Hero", &[], &[("Orc Village", 60, 70, 1), ("Geffen Field", 1440, 1450, 1)]),
    seed("Orc Lord", &[], &[("Orc Village", 120, 130, 1)]),
    seed("Osiris", &[], &[("Pyramid", 60, 70, 1)]),
    seed("Pharaoh", &[], &[("Sphinx", 60, 70, 1)]),
    seed("Phreeoni", &[], &[("Morroc Field", 120, 130, 1)]),
    seed("Pyuriel", &[], &[("Hall of the Abyss", 480, 490, 1)]),
    seed("Queen Scaraba", &[], &[("Skarava", 120, 120, 1)]),
    seed("RSX 0806", &[], &[("Einbroch", 125, 135, 1)]),
    seed("Stormy Knight", &["knight_of_windstorm"], &[("Toy Factory", 60, 70, 1)]),
    seed("Tao Gunka", &[], &[("Beach Dungeon", 300, 310, 1)]),
    seed("Tendrillion", &["td"], &[("Splendide Field", 60, 60, 1)]),
    seed("Turtle General", &[], &[("Turtle Dungeon", 60, 70, 1)]),
    seed("Valkyrie Randgris", &[], &[("Odin Temple", 480, 490, 1)]),
    seed("Vesper", &[], &[("Juperos", 120, 130, 1)]),
    seed("Wounded Morroc", &["satan_morroc"], &[("Morroc Field", 720, 780, 1)]),
    seed(
        "Angeling",
        &["al"],
        &[
            ("Poring Island", 60, 90, 1),
            ("Toy Factory", 60, 90, 1),
            ("Yuno Field", 60, 90, 1),
        ],
    ),
    seed("Archangeling", &["aa"], &[("Yuno Field", 60, 63, 1)]),
    seed(
        "Bloody Knight",
        &[],
        &[
            ("Geffenia 1", 60, 110, 1),
            ("Geffenia 2", 60, 110, 1),
            ("Geffenia 3", 60, 110, 1),
            ("Geffenia 4", 60, 110, 1),
            ("Glast Heim", 60, 110, 1),
        ],
    ),
    seed("Byorgue", &[], &[("Thor 1", 60, 60, 1), ("Thor 2", 30, 30, 5)]),
    seed("Cat o' Nine Tails", &["cat9", "c9"], &[("Payon", 60, 180, 1), ("Greenwood", 20, 20, 3)]),
    seed("Chepet", &[], &[("Toy Factory", 20, 35, 1)]),
    seed("Chimera", &[], &[("Glast Heim", 60, 90, 1)]),
    seed(
        "Dark Illusion",
        &[],
        &[
            ("Glast Heim", 60, 90, 1),
            ("Britoniah", 20, 20, 1),
            ("Britoniah 2", 20, 20, 1),
            ("Hall of the Abyss", 20, 20, 1),
        ],
    ),
    seed("Deviling", &[], &[("Poring Island", 120, 180, 1), ("Yuno Field", 60, 90, 1)]),
    seed(
        "Dragon Egg",
        &["degg", "dregg", "dragegg"],
        &[
            ("Abyss 1 Center", 30, 40, 5),
            ("Abyss 1 Corner", 20, 30, 3),
            ("Abyss 2", 30, 40, 10),
            ("Abyss 3", 30, 40, 10),
            ("Hugel Field", 120, 150, 4),
        ],
    ),
    seed("Dragon Fly", &["dfly"], &[("Morroc Field", 60, 90, 1)]),
    seed("Eclipse", &[], &[("Prontera Field", 30, 50, 1), ("Hidden", 32, 35, 1)]),
    seed(
        "Executioner",
        &[],
        &[
            ("Geffenia 1", 300, 540, 1),
            ("Geffenia 2", 300, 540, 1),
            ("Geffenia 3", 180, 300, 1),
            ("Geffenia 4", 300, 540, 1),
            ("Clock Tower 4", 120, 180, 1),
            ("Close Tower B4", 60, 90, 1),
        ],
    ),
    seed(
        "Garm Baby",
        &["garm_bebe", "hatii_baby", "hatii_bebe"],
        &[
            ("Lutie Field", 30, 30, 1),
            ("Toy Factory", 30, 30, 1),
        ],
    ),
    seed("Gemini", &[], &[("Bio 1", 120, 210, 1), ("Bio 2", 90, 93, 10)]),
    seed(
        "Ghostring",
        &["gr"],
        &[
            ("Poring Island", 60, 90, 1),
            ("Sunken Ship", 33, 53, 1),
            ("Hidden", 113, 170, 1),
            ("Britoniah", 240, 360, 1),
        ],
    ),
    seed("Goblin Leader", &[], &[("Geffen Field", 30, 50, 1)]),
    seed(
        "Gryphon",
        &[],
        &[
            ("Comodo Field", 60, 90, 1),
            ("Rachel Field", 60, 60, 3),
            ("Umbala Field", 58, 90, 1),
        ],
    ),
    seed("Hydro", &["hydrolancer"], &[("Abyss", 50, 90, 3)]),
    seed("Kobold Leader", &[], &[("Geffen Field", 30, 50, 1), ("Valkyrie", 240, 360, 1)]),
    seed(
        "Mastering",
        &[],
        &[
            ("Hidden", 32, 35, 1),
            ("Poring Island", 60, 90, 1),
            ("Toy Factory", 30, 45, 1),
            ("Yuno Field", 60, 90, 1),
        ],
    ),
    seed(
        "Maya Purple",
        &[],
        &[
            ("Anthell", 120, 180, 1),
            ("Hall of the Abyss", 20, 20, 3),
            ("Luina 2", 20, 30, 3),
            ("Valkyrie", 20, 30, 3),
        ],
    ),
    seed("Mutant Dragonoid", &["mutdrag"], &[("Hugel Field", 400, 430, 4)]),
    seed(
        "Mysteltainn",
        &[],
        &[
            ("Clock Tower", 60, 90, 1),
            ("Geffenia 1", 180, 300, 1),
            ("Geffenia 2", 300, 540, 1),
            ("Geffenia 3", 300, 540, 1),
            ("Geffenia 4", 300, 540, 1),
            ("Glast Heim Castle", 120, 180, 1),
            ("Glast Heim Chivalry", 30, 50, 1),
        ],
    ),
    seed("Panzer Goblin", &[], &[("Prontera Field", 30, 50, 1)]),
    seed("Thanatos Despero", &["despero"], &[("Thana 7", 30, 50, 2), ("Thana 11", 30, 50, 1)]),
    seed("Thanatos Dolor", &["dolor"], &[("Thana 5", 30, 50, 2), ("Thana 9", 30, 50, 1)]),
    seed("Thanatos Maero", &["maero"], &[("Thana 6", 30, 50, 2), ("Thana 10", 30, 50, 1)]),
    seed("Thanatos Odium", &["odium"], &[("Thana", 30, 50, 2)]),
    seed(
        "Tirfing",
        &["ogretooth"],
        &[
            ("Geffenia 1", 300, 540, 1),
            ("Geffenia 2", 180, 300, 1),
            ("Geffenia 3", 300, 540, 1),
            ("Geffenia 4", 300, 540, 1),
            ("Clock Tower", 60, 90, 1),
            ("Geffen", 30, 50, 1),
            ("Glast Heim 1", 120, 180, 1),
            ("Glast Heim 2", 120, 180, 1),
        ],
    ),
    seed("Toad", &[], &[("Comodo Field", 60, 90, 1), ("Geffen Field", 60, 90, 1)]),
    seed(
        "Ungoliant",
        &["ug"],
        &[
            ("Einbroch", 60, 110, 1),
            ("Einbroch Field 2", 1260, 2510, 1),
            ("Einbroch Field 7", 1440, 2873, 1),
        ],
    ),
    seed(
        "Vagabond Wolf",
        &[],
        &[
            ("Morroc Field", 30, 50, 1),
            ("Hidden 1", 60, 90, 1),
            ("Hidden 3", 32, 35, 1),
            ("Greenwood", 240, 360, 1),
        ],
    ),
    seed("Valkyrie", &["valkmini"], &[("Odin 2", 90, 120, 1), ("Odin 3", 30, 50, 2)]),
    seed(
        "Vocal",
        &[],
        &[
            ("Prontera Field 4", 30, 50, 1),
            ("Prontera Field 7", 30, 50, 1),
            ("Hidden", 32, 57, 1),
        ],
    ),
    seed("Zealotus", &["zherlthsh"], &[("Glast Heim", 60, 90, 1)]),
];

/// Entity configs of the built-in catalog, without derived aliases.
pub fn default_entities() -> BTreeMap<String, EntityConfig> {
    SEEDS
        .iter()
        .map(|seed| {
            let mut spawns = BTreeMap::new();
            for &(location, min, max, copies) in seed.spawns {
                let rule = SpawnRule { min, max };
                if copies > 1 {
                    for copy in 1..=copies {
                        spawns.insert(format!("{location}[{copy}]"), rule);
                    }
                } else {
                    spawns.insert(location.to_string(), rule);
                }
            }
            let config = EntityConfig {
                aliases: seed.aliases.iter().map(|alias| alias.to_string()).collect(),
                spawns,
            };
            (seed.name.to_string(), config)
        })
        .collect()
}

/// The built-in catalog with implicit aliases applied.
pub fn default_catalog() -> TrackerResult<EntityCatalog> {
    EntityCatalog::from_entities(default_entities(), true)
}
