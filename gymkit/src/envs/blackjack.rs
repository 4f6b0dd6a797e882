//! Blackjack against a dealer, drawn from an infinite deck.
//!
//! The player starts with two cards and sees one of the dealer's. Hitting
//! draws another card; going over 21 loses immediately. Sticking lets the
//! dealer draw until 17 or more, then the closer hand to 21 wins.
//!
//! Observation: `(player sum, dealer showing card, usable ace)`, with the
//! dealer's ace shown as 1. Actions: `0` stick, `1` hit.
//!
//! Rewards are +1 win, -1 loss, 0 draw. With `natural=true` a winning natural
//! (ace plus ten-card) pays 1.5. With `sab=true` the rules of Sutton & Barto's
//! example 5.1 apply instead: a player natural beats any dealer hand that is
//! not itself a natural, and `natural` is ignored.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{
    Env, EnvError, EnvMetadata, Info, RenderFrame, RenderMode, Step, ensure_action, show_human,
};
use crate::registry::Kwargs;
use crate::spaces::{Element, Space, SpaceError};

static METADATA: EnvMetadata = EnvMetadata {
    render_modes: &[RenderMode::Human, RenderMode::Ansi],
    render_fps: Some(4),
};

// 1 = Ace, 2-10 = number cards, Jack/Queen/King = 10
const DECK: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

const STICK: i64 = 0;

pub struct Blackjack {
    natural: bool,
    sab: bool,
    render_mode: Option<RenderMode>,
    action_space: Space,
    observation_space: Space,
    rng: StdRng,
    player: Vec<u8>,
    dealer: Vec<u8>,
}

impl Blackjack {
    pub fn new(natural: bool, sab: bool, render_mode: Option<RenderMode>) -> Result<Self, SpaceError> {
        Ok(Self {
            natural,
            sab,
            render_mode,
            action_space: Space::discrete(2)?,
            observation_space: Space::tuple(vec![
                Space::discrete(32)?,
                Space::discrete(11)?,
                Space::discrete(2)?,
            ]),
            rng: StdRng::from_os_rng(),
            player: Vec::new(),
            dealer: Vec::new(),
        })
    }

    pub(crate) fn entry_point(
        kwargs: &mut Kwargs,
        render_mode: Option<RenderMode>,
    ) -> Result<Box<dyn Env>, EnvError> {
        let natural = kwargs.bool("natural", false)?;
        let sab = kwargs.bool("sab", false)?;
        Ok(Box::new(Self::new(natural, sab, render_mode)?))
    }

    fn draw_card(&mut self) -> u8 {
        DECK[self.rng.random_range(0..DECK.len())]
    }

    fn draw_hand(&mut self) -> Vec<u8> {
        vec![self.draw_card(), self.draw_card()]
    }

    fn observation(&self) -> Element {
        Element::Tuple(vec![
            Element::Int(sum_hand(&self.player) as i64),
            Element::Int(self.dealer[0] as i64),
            Element::Int(usable_ace(&self.player) as i64),
        ])
    }

    fn ansi(&self) -> String {
        if self.player.is_empty() {
            return "Blackjack: no hand dealt".to_string();
        }
        format!(
            "Player sum: {} (usable ace: {}) | Dealer showing: {}",
            sum_hand(&self.player),
            if usable_ace(&self.player) { "yes" } else { "no" },
            card_name(self.dealer[0]),
        )
    }

    fn render_human(&self) {
        if self.render_mode == Some(RenderMode::Human) {
            show_human(&RenderFrame::Text(self.ansi()));
        }
    }

    // Dealer plays out the hand, then the hands are compared.
    fn settle(&mut self) -> f64 {
        while sum_hand(&self.dealer) < 17 {
            let card = self.draw_card();
            self.dealer.push(card);
        }
        let reward = cmp(score(&self.player), score(&self.dealer));
        if self.sab && is_natural(&self.player) && !is_natural(&self.dealer) {
            1.0
        } else if !self.sab && self.natural && is_natural(&self.player) && reward == 1.0 {
            1.5
        } else {
            reward
        }
    }
}

impl Env for Blackjack {
    fn metadata(&self) -> &EnvMetadata {
        &METADATA
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.dealer = self.draw_hand();
        self.player = self.draw_hand();
        self.render_human();
        Ok((self.observation(), Info::new()))
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        ensure_action(&self.action_space, action)?;
        if self.player.is_empty() {
            return Err(EnvError::Step("no hand dealt, call reset first".into()));
        }

        let step = if action.as_int() == Some(STICK) {
            let reward = self.settle();
            Step::new(self.observation(), reward, true, false)
        } else {
            let card = self.draw_card();
            self.player.push(card);
            let bust = is_bust(&self.player);
            Step::new(self.observation(), if bust { -1.0 } else { 0.0 }, bust, false)
        };
        self.render_human();
        Ok(step)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        match self.render_mode {
            Some(RenderMode::Ansi) => Ok(Some(RenderFrame::Text(self.ansi()))),
            Some(RenderMode::Human) => {
                show_human(&RenderFrame::Text(self.ansi()));
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

fn card_name(card: u8) -> String {
    match card {
        1 => "A".to_string(),
        n => n.to_string(),
    }
}

fn cmp(a: u8, b: u8) -> f64 {
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
    }
}

fn usable_ace(hand: &[u8]) -> bool {
    hand.contains(&1) && hand.iter().sum::<u8>() + 10 <= 21
}

fn sum_hand(hand: &[u8]) -> u8 {
    let total = hand.iter().sum::<u8>();
    if usable_ace(hand) { total + 10 } else { total }
}

fn is_bust(hand: &[u8]) -> bool {
    sum_hand(hand) > 21
}

fn score(hand: &[u8]) -> u8 {
    if is_bust(hand) { 0 } else { sum_hand(hand) }
}

fn is_natural(hand: &[u8]) -> bool {
    let mut sorted = hand.to_vec();
    sorted.sort_unstable();
    sorted == [1, 10]
}
