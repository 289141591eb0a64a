use alloy_sol_types::sol;

// ABI shapes confirmed against the HEROES_ABI / WEAPONS_ABI minimal ABIs
// (tokensOfOwner, getAttribs, getTokenInfo) and the ERC-1155 land contract /
// ERC-20 reward token interfaces named in spec §6.
sol! {
    #[sol(rpc)]
    interface IHeroToken {
        function tokensOfOwner(address owner) external view returns (uint256[] memory);
        function getAttribs(uint256 tokenId) external view returns (uint256 sec, uint256 ano, uint256 inn);
        function getTokenInfo(uint256 tokenId) external view returns (uint256 seasonCardId, uint256 serialNumber);
    }

    #[sol(rpc)]
    interface IWeaponToken {
        function tokensOfOwner(address owner) external view returns (uint256[] memory);
        function getAttribs(uint256 tokenId) external view returns (uint256 security, uint256 anonymity, uint256 innovation);
        function getTokenInfo(uint256 tokenId) external view returns (uint256 tier, uint256 weaponType, uint256 subtype, uint256 category, uint256 serialNumber);
    }

    #[sol(rpc)]
    interface IErc1155Land {
        function balanceOfBatch(address[] calldata owners, uint256[] calldata ids) external view returns (uint256[] memory);
    }

    #[sol(rpc)]
    interface IErc20Reward {
        function balanceOf(address account) external view returns (uint256);
    }
}
