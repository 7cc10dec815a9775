use crate::material::Material;

/// Number of candidate recommendations per material
pub const POOL_SIZE: usize = 10;

const GLASS: [&str; POOL_SIZE] = [
    "Avoid breaking it and drop it in a glass recycling container.",
    "Remove caps and labels before placing it in the green container.",
    "Glass can be recycled endlessly without losing quality. Every bottle counts!",
    "Sort glass by colour if your town requires it: clear, green and amber.",
    "Never mix window glass, mirrors or light bulbs with glass packaging.",
    "One recycled glass bottle saves enough energy to power a light bulb for 4 hours.",
    "Give the container a quick rinse to remove leftovers; it does not need to be spotless.",
    "Broken glass packaging is recyclable too, but handle it with care.",
    "Glass containers are available around the clock, drop it off any time.",
    "Recycling glass cuts CO2 emissions and conserves natural raw materials.",
];

const PAPER: [&str; POOL_SIZE] = [
    "Keep clean paper apart from cardboard, avoid laminated sheets and use the paper container.",
    "Remove staples, clips and sticky tape before recycling.",
    "Crumpled paper recycles perfectly well, there is no need to flatten it.",
    "Keep paper with food scraps, grease or chemicals out of the paper bin.",
    "Envelopes with plastic windows belong in the yellow container, not the blue one.",
    "Tissues, used napkins and toilet paper go in the organic bin.",
    "One tonne of recycled paper saves roughly 17 trees.",
    "Thermal receipts (the shiny ones) are not recycled with regular paper.",
    "Laminated or metallic wrapping paper goes in the yellow container.",
    "Magazines, newspapers and leaflets are perfect for the blue container.",
];

const CARDBOARD: [&str; POOL_SIZE] = [
    "Fold boxes flat to save space and drop them in the paper and cardboard container.",
    "Remove sticky tape, staples and plastic labels before recycling.",
    "Drink cartons belong in the yellow container, not the blue one.",
    "Cardboard soiled with food goes in the organic bin.",
    "Tear large boxes apart so they take up less room in the container.",
    "Corrugated cardboard is fully recyclable and highly valued in the process.",
    "Keeping cardboard apart from paper helps optimise the recycling process.",
    "A cardboard box can be recycled up to 7 times before it loses quality.",
    "Waxed or plastic-coated cardboard needs to be sorted separately.",
    "Recycling cardboard halves the water and energy used to make new board.",
];

const PLASTIC: [&str; POOL_SIZE] = [
    "Sort plastics by type when you can, remove food leftovers and use the plastics container.",
    "Look for the recycling number on the package to identify the type of plastic.",
    "Rinse containers to remove organic leftovers before recycling.",
    "Small caps get lost easily, keep them attached to the container if possible.",
    "Avoid crushing bottles top to bottom; flatten them sideways instead.",
    "Black plastics are hard to recycle, prefer other colours.",
    "A plastic bottle can take up to 450 years to break down naturally.",
    "Yogurt pots and food trays are recyclable too.",
    "Only peel off labels if they come away easily, otherwise leave them on.",
    "Recycled plastic can become clothing, furniture and new packaging.",
];

const CANS: [&str; POOL_SIZE] = [
    "Rinse empty cans and place them in the metal recycling container.",
    "There is no need to remove paper labels from cans.",
    "Squash cans to save space, but not completely.",
    "Aluminium cans can be recycled endlessly without losing their properties.",
    "A recycled aluminium can saves 95% of the energy needed to make a new one.",
    "Food tins (steel) are fully recyclable as well.",
    "Detach the lid completely and drop it in together with the can.",
    "A can may be back on the shelf just 60 days after being recycled.",
    "Aluminium can recycling is one of the most efficient and profitable streams.",
    "Drink cans and food tins go in the same yellow container.",
];

/// Fixed candidate pool for a material
pub fn pool(material: Material) -> &'static [&'static str; POOL_SIZE] {
    match material {
        Material::Glass => &GLASS,
        Material::Paper => &PAPER,
        Material::Cardboard => &CARDBOARD,
        Material::Plastic => &PLASTIC,
        Material::Cans => &CANS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pools_have_distinct_entries() {
        for material in Material::ALL {
            let unique: HashSet<_> = pool(material).iter().collect();
            assert_eq!(unique.len(), POOL_SIZE, "duplicate entry in {} pool", material);
        }
    }
}
